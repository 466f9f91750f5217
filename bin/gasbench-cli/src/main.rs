//! `gasbench` CLI tool for measuring the gas cost of on-chain randomness protocols
//!
//! This tool drives repeated protocol flows against deployed contracts through a JSON-RPC node
//! and prints per-operation gas totals, averages and raw series.

use clap::Parser;

mod cmd;
pub use cmd::*;

/// Benchmark command
pub mod bench;
/// Shared CLI plumbing
pub mod common;
/// Input preview command
pub mod inputs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    set_thread_panic_hook();
    MainCmd::parse().run().await.inspect_err(|e| println!("{e}"))
}

/// Sets thread panic hook, useful for having tests that panic.
fn set_thread_panic_hook() {
    use std::{
        backtrace::Backtrace,
        panic::{set_hook, take_hook},
        process::exit,
    };
    let orig_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        println!("Custom backtrace: {}", Backtrace::capture());
        orig_hook(panic_info);
        exit(1);
    }));
}
