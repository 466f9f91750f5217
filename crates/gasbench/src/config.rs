//! Deployed contract addresses.

use std::{collections::BTreeMap, fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, protocols::Protocol};

/// Deployed address of each benchmarked contract, keyed by [`Protocol::config_key`].
///
/// Loaded once at startup. Unrelated keys are kept but never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(BTreeMap<String, Address>);

impl AddressBook {
    /// Reads an address book from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses an address book from a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Sets the address of `protocol`.
    pub fn insert(&mut self, protocol: Protocol, address: Address) {
        self.0.insert(protocol.config_key().to_string(), address);
    }

    /// The address of `protocol`.
    pub fn address(&self, protocol: Protocol) -> Result<Address, ConfigError> {
        self.0
            .get(protocol.config_key())
            .copied()
            .ok_or(ConfigError::MissingAddress(protocol.config_key()))
    }
}

impl FromIterator<(Protocol, Address)> for AddressBook {
    fn from_iter<T: IntoIterator<Item = (Protocol, Address)>>(iter: T) -> Self {
        let mut book = Self::default();
        for (protocol, address) in iter {
            book.insert(protocol, address);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn parses_protocol_keys() {
        let book = AddressBook::from_json(
            r#"{
                "vrf": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "crypto_operations": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
                "deployer": "0x0000000000000000000000000000000000000001"
            }"#,
        )
        .unwrap();

        assert_eq!(
            book.address(Protocol::Vrf).unwrap(),
            address!("5FbDB2315678afecb367f032d93F642f64180aa3")
        );
        assert_eq!(
            book.address(Protocol::CryptoOperations).unwrap(),
            address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512")
        );
    }

    #[test]
    fn missing_entry_is_a_config_error() {
        let book = AddressBook::from_json(r#"{"vrf": "0x5FbDB2315678afecb367f032d93F642f64180aa3"}"#)
            .unwrap();
        assert!(matches!(
            book.address(Protocol::FlexiRand),
            Err(ConfigError::MissingAddress("flexirand"))
        ));
    }

    #[test]
    fn malformed_address_is_rejected() {
        assert!(matches!(
            AddressBook::from_json(r#"{"vrf": "0x1234"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unreadable_file_is_rejected() {
        assert!(matches!(
            AddressBook::load("/nonexistent/addresses.json"),
            Err(ConfigError::Read(_))
        ));
    }
}
