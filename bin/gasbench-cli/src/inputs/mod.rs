//! Input preview command.

mod cmd;

pub use cmd::*;
