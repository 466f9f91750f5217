//! Randomized, shape-conformant call arguments.
//!
//! Values match the byte length, tuple arity and field order each contract operation expects.
//! Their content is uniformly random and carries no cryptographic validity.

use core::fmt;

use alloy_primitives::{hex, Address, Bytes, B256, U256};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{contracts::DdhProof, error::SynthesisError};

/// Byte length of an address-shaped value.
pub const ADDRESS_LEN: usize = 20;

/// Byte length of a field-element or hash-shaped value.
pub const WORD_LEN: usize = 32;

/// A random byte string of fixed length, rendered as `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct RandomValue(Bytes);

impl RandomValue {
    /// Number of bytes in the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: synthesis rejects empty values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding with the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }
}

impl fmt::Display for RandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<RandomValue> for Bytes {
    fn from(value: RandomValue) -> Self {
        value.0
    }
}

/// Source of protocol-shaped random inputs.
///
/// Each benchmark unit owns its own factory. Concurrent units get a child generator via
/// [`InputFactory::fork`], so a seeded run is reproducible regardless of interleaving.
#[derive(Debug, Clone)]
pub struct InputFactory {
    rng: StdRng,
}

impl Default for InputFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl InputFactory {
    /// Creates a factory seeded from the operating system.
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Creates a deterministic factory.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Derives an independent child factory.
    pub fn fork(&mut self) -> Self {
        Self { rng: StdRng::from_rng(&mut self.rng) }
    }

    /// Returns `len` random bytes. Fails only for `len == 0`.
    pub fn random_bytes(&mut self, len: usize) -> Result<RandomValue, SynthesisError> {
        if len == 0 {
            return Err(SynthesisError::InvalidLength(len));
        }
        let mut buf = vec![0u8; len];
        self.rng.fill_bytes(&mut buf);
        Ok(RandomValue(buf.into()))
    }

    /// A random 32-byte hash-shaped value.
    pub fn random_b256(&mut self) -> B256 {
        let mut buf = [0u8; WORD_LEN];
        self.rng.fill_bytes(&mut buf);
        B256::from(buf)
    }

    /// A random 32-byte field element.
    pub fn random_word(&mut self) -> U256 {
        U256::from_be_bytes(self.random_b256().0)
    }

    /// `K` independent 32-byte field elements. Position encodes the semantic role (x then y
    /// for curve points).
    pub fn random_field_tuple<const K: usize>(&mut self) -> [U256; K] {
        core::array::from_fn(|_| self.random_word())
    }

    /// A random 20-byte address-shaped value.
    pub fn random_address(&mut self) -> Address {
        let mut buf = [0u8; ADDRESS_LEN];
        self.rng.fill_bytes(&mut buf);
        Address::from(buf)
    }

    /// A DDH proof with every field random.
    pub fn random_ddh_proof(&mut self) -> DdhProof {
        let gamma = self.random_field_tuple();
        self.fixed_gamma_ddh_proof(gamma)
    }

    /// A DDH proof whose `gamma` is copied verbatim and whose other fields are fresh.
    pub fn fixed_gamma_ddh_proof(&mut self, gamma: [U256; 2]) -> DdhProof {
        DdhProof {
            pk: self.random_field_tuple(),
            gamma,
            c: self.random_word(),
            s: self.random_word(),
            seed: self.random_word(),
            uWitness: self.random_address(),
            cGammaWitness: self.random_field_tuple(),
            sHashWitness: self.random_field_tuple(),
            zInv: self.random_word(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(20)]
    #[case(32)]
    #[case(97)]
    fn random_bytes_has_exact_hex_length(#[case] len: usize) {
        let mut factory = InputFactory::seeded(7);
        let value = factory.random_bytes(len).unwrap();
        let hex = value.to_string();

        assert_eq!(value.len(), len);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 2 + 2 * len);
        assert!(hex[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn random_bytes_rejects_zero_length() {
        let mut factory = InputFactory::seeded(7);
        assert_eq!(factory.random_bytes(0), Err(SynthesisError::InvalidLength(0)));
    }

    #[test]
    fn consecutive_values_differ() {
        let mut factory = InputFactory::new();
        let a = factory.random_bytes(WORD_LEN).unwrap();
        let b = factory.random_bytes(WORD_LEN).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn field_tuples_have_requested_arity() {
        let mut factory = InputFactory::seeded(1);
        let pair: [U256; 2] = factory.random_field_tuple();
        let quad: [U256; 4] = factory.random_field_tuple();

        assert_eq!(pair.len(), 2);
        assert_eq!(quad.len(), 4);
        assert_ne!(pair[0], pair[1]);
        assert!(quad.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn fixed_gamma_proof_keeps_gamma_and_refreshes_the_rest() {
        let mut factory = InputFactory::seeded(3);
        let gamma = factory.random_field_tuple();

        let first = factory.fixed_gamma_ddh_proof(gamma);
        let second = factory.fixed_gamma_ddh_proof(gamma);

        assert_eq!(first.gamma, gamma);
        assert_eq!(second.gamma, gamma);
        assert_ne!(first.pk, second.pk);
        assert_ne!(first.c, second.c);
        assert_ne!(first.s, second.s);
        assert_ne!(first.seed, second.seed);
        assert_ne!(first.uWitness, second.uWitness);
        assert_ne!(first.cGammaWitness, second.cGammaWitness);
        assert_ne!(first.sHashWitness, second.sHashWitness);
        assert_ne!(first.zInv, second.zInv);
    }

    #[test]
    fn seeded_factories_are_reproducible() {
        let mut a = InputFactory::seeded(42);
        let mut b = InputFactory::seeded(42);
        assert_eq!(a.random_ddh_proof(), b.random_ddh_proof());

        let mut child_a = a.fork();
        let mut child_b = b.fork();
        assert_eq!(child_a.random_b256(), child_b.random_b256());
        assert_ne!(child_a.random_b256(), a.random_b256());
    }
}
