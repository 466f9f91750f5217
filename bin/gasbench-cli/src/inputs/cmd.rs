use alloy_primitives::U256;
use clap::Parser;
use gasbench::{contracts::DdhProof, InputFactory, WORD_LEN};
use serde_json::{json, Value};

use crate::common::{LogArgs, Result};

/// Shape of the synthesized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputKind {
    /// Nine-field DDH proof
    DdhProof,
    /// Curve point or signature (two field elements)
    Point,
    /// Extended public key (four field elements)
    Key,
    /// Address-shaped value
    Address,
    /// Random byte string of `--len` bytes
    Bytes,
}

/// Print freshly synthesized call arguments as JSON
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Shape to synthesize
    #[arg(value_enum, default_value_t = InputKind::DdhProof)]
    pub kind: InputKind,

    /// Number of values to print
    #[arg(long = "count", short = 'c', default_value_t = 1)]
    pub count: usize,

    /// Byte length of `bytes` values
    #[arg(long = "len", default_value_t = WORD_LEN)]
    pub len: usize,

    /// Seed for reproducible output
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,
}

impl Cmd {
    /// Execute the inputs command
    pub fn run(&self) -> Result<()> {
        self.log_args.init()?;
        let values = self.synthesize()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
        Ok(())
    }

    /// Synthesizes `count` values of the selected kind.
    pub fn synthesize(&self) -> Result<Vec<Value>> {
        let mut inputs = self.seed.map_or_else(InputFactory::new, InputFactory::seeded);
        (0..self.count)
            .map(|_| -> Result<Value> {
                Ok(match self.kind {
                    InputKind::DdhProof => ddh_proof_json(&inputs.random_ddh_proof()),
                    InputKind::Point => json!(inputs.random_field_tuple::<2>()),
                    InputKind::Key => json!(inputs.random_field_tuple::<4>()),
                    InputKind::Address => json!(inputs.random_address()),
                    InputKind::Bytes => json!(inputs.random_bytes(self.len)?),
                })
            })
            .collect()
    }
}

fn pair(values: &[U256; 2]) -> Value {
    json!(values)
}

/// Renders a proof with its fields in calldata order.
fn ddh_proof_json(proof: &DdhProof) -> Value {
    json!({
        "pk": pair(&proof.pk),
        "gamma": pair(&proof.gamma),
        "c": proof.c,
        "s": proof.s,
        "seed": proof.seed,
        "uWitness": proof.uWitness,
        "cGammaWitness": pair(&proof.cGammaWitness),
        "sHashWitness": pair(&proof.sHashWitness),
        "zInv": proof.zInv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CliError;
    use gasbench::SynthesisError;

    fn cmd(args: &[&str]) -> Cmd {
        Cmd::try_parse_from(std::iter::once("inputs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn proof_has_every_field() {
        let values = cmd(&["--seed", "1"]).synthesize().unwrap();
        let proof = values[0].as_object().unwrap();

        assert_eq!(proof.len(), 9);
        assert_eq!(proof["gamma"].as_array().unwrap().len(), 2);
        assert!(proof["uWitness"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn seeded_output_is_reproducible() {
        let args = ["key", "--count", "3", "--seed", "9"];
        assert_eq!(cmd(&args).synthesize().unwrap(), cmd(&args).synthesize().unwrap());
        assert_eq!(cmd(&args).synthesize().unwrap().len(), 3);
    }

    #[test]
    fn bytes_have_requested_length() {
        let values = cmd(&["bytes", "--len", "20"]).synthesize().unwrap();
        assert_eq!(values[0].as_str().unwrap().len(), 2 + 40);
    }

    #[test]
    fn zero_length_bytes_are_rejected() {
        let err = cmd(&["bytes", "--len", "0"]).synthesize().unwrap_err();
        assert!(matches!(err, CliError::Synthesis(SynthesisError::InvalidLength(0))));
    }
}
