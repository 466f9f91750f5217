//! Gas extraction from transaction outcomes.
//!
//! A benchmarked operation reports its gas either through a dedicated event (the contract meters
//! an inner segment and emits the figure) or through the transaction receipt. Both policies
//! require the step's event to be present: its absence means the contract did not reach the
//! measured code path and no sample is taken. Only logs emitted by the benchmarked contract
//! itself are considered.

use alloy_primitives::{Address, U256};

use crate::{
    client::TxOutcome,
    contracts::{KeyedEvent, MeteredEvent},
    error::ExtractionError,
};

/// Where the gas figure of an operation is read from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum GasSource {
    /// The `gas` field of the step's event payload.
    #[display("event")]
    Event,
    /// The transaction's total consumed gas.
    #[display("receipt")]
    Receipt,
}

/// A resolved outcome, tagged by where its gas figure came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metered<E> {
    /// Gas read from the event payload.
    EventSourced {
        /// The step's event.
        event: E,
        /// The event's gas figure.
        gas: u64,
    },
    /// Gas read from the receipt; the event is kept for forwarded values.
    ReceiptSourced {
        /// The step's event.
        event: E,
        /// Total gas consumed by the transaction.
        gas_used: u64,
    },
}

impl<E: MeteredEvent> Metered<E> {
    /// The gas figure attributable to the operation.
    pub const fn gas(&self) -> u64 {
        match self {
            Self::EventSourced { gas, .. } => *gas,
            Self::ReceiptSourced { gas_used, .. } => *gas_used,
        }
    }

    /// The decoded event.
    pub const fn event(&self) -> &E {
        match self {
            Self::EventSourced { event, .. } | Self::ReceiptSourced { event, .. } => event,
        }
    }
}

impl<E: KeyedEvent> Metered<E> {
    /// The identifier the contract assigned in this step.
    pub fn key(&self) -> U256 {
        self.event().key()
    }
}

/// Finds the first log emitted by `contract` on `outcome` that decodes as `E`.
pub fn find_event<E: MeteredEvent>(
    outcome: &TxOutcome,
    contract: Address,
) -> Result<E, ExtractionError> {
    outcome
        .logs
        .iter()
        .filter(|log| log.address == contract)
        .find_map(|log| E::decode_log(log, true).ok())
        .map(|log| log.data)
        .ok_or(ExtractionError::MissingEvent(E::NAME))
}

/// Resolves the gas figure of the call to `contract` that produced `outcome`, under `source`.
pub fn extract<E: MeteredEvent>(
    outcome: &TxOutcome,
    contract: Address,
    source: GasSource,
) -> Result<Metered<E>, ExtractionError> {
    let event = find_event::<E>(outcome, contract)?;
    Ok(match source {
        GasSource::Event => {
            let gas = u64::try_from(event.gas())
                .map_err(|_| ExtractionError::GasOutOfRange(E::NAME, event.gas()))?;
            Metered::EventSourced { event, gas }
        }
        GasSource::Receipt => Metered::ReceiptSourced { event, gas_used: outcome.gas_used },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ICryptoOperations, IVrf};
    use alloy_primitives::{address, Log, B256};
    use alloy_sol_types::SolEvent;

    const CONTRACT: Address = address!("1000000000000000000000000000000000000001");
    const INNER: Address = address!("3000000000000000000000000000000000000003");

    fn outcome(gas_used: u64, logs: Vec<Log>) -> TxOutcome {
        TxOutcome { tx_hash: B256::ZERO, gas_used, logs }
    }

    fn log<E: SolEvent>(event: &E) -> Log {
        log_from(CONTRACT, event)
    }

    fn log_from<E: SolEvent>(address: Address, event: &E) -> Log {
        Log { address, data: event.encode_log_data() }
    }

    #[test]
    fn event_sourced_gas_comes_from_payload() {
        let event = ICryptoOperations::GasMeasuredOperations { gas: U256::from(3_100) };
        let outcome = outcome(48_000, vec![log(&event)]);

        let metered = extract::<ICryptoOperations::GasMeasuredOperations>(
            &outcome,
            CONTRACT,
            GasSource::Event,
        )
        .unwrap();
        assert_eq!(metered.gas(), 3_100);
    }

    #[test]
    fn receipt_sourced_gas_comes_from_receipt() {
        let event = IVrf::ReqGen { reqid: U256::from(9), gas: U256::from(3_100) };
        let outcome = outcome(48_000, vec![log(&event)]);

        let metered = extract::<IVrf::ReqGen>(&outcome, CONTRACT, GasSource::Receipt).unwrap();
        assert_eq!(metered.gas(), 48_000);
        assert_eq!(metered.key(), U256::from(9));
    }

    #[test]
    fn missing_event_is_an_extraction_error() {
        let other = IVrf::ReqFulf { reqid: U256::from(1), gas: U256::from(1) };
        let outcome = outcome(48_000, vec![log(&other)]);

        assert_eq!(
            extract::<IVrf::ReqGen>(&outcome, CONTRACT, GasSource::Receipt),
            Err(ExtractionError::MissingEvent("ReqGen"))
        );
    }

    #[test]
    fn first_matching_log_wins() {
        let unrelated = IVrf::ReqFulf { reqid: U256::from(1), gas: U256::from(1) };
        let first = IVrf::ReqGen { reqid: U256::from(4), gas: U256::from(10) };
        let second = IVrf::ReqGen { reqid: U256::from(5), gas: U256::from(20) };
        let outcome = outcome(1, vec![log(&unrelated), log(&first), log(&second)]);

        let metered = extract::<IVrf::ReqGen>(&outcome, CONTRACT, GasSource::Event).unwrap();
        assert_eq!(metered.key(), U256::from(4));
        assert_eq!(metered.gas(), 10);
    }

    #[test]
    fn logs_from_other_emitters_are_ignored() {
        let inner = IVrf::ReqGen { reqid: U256::from(2), gas: U256::from(7) };
        let own = IVrf::ReqGen { reqid: U256::from(3), gas: U256::from(9) };

        let only_inner = outcome(1, vec![log_from(INNER, &inner)]);
        assert_eq!(
            extract::<IVrf::ReqGen>(&only_inner, CONTRACT, GasSource::Event),
            Err(ExtractionError::MissingEvent("ReqGen"))
        );

        let both = outcome(1, vec![log_from(INNER, &inner), log(&own)]);
        let metered = extract::<IVrf::ReqGen>(&both, CONTRACT, GasSource::Event).unwrap();
        assert_eq!(metered.key(), U256::from(3));
        assert_eq!(metered.gas(), 9);
    }

    #[test]
    fn oversized_event_gas_is_rejected() {
        let event = ICryptoOperations::GasMeasuredOperations { gas: U256::MAX };
        let outcome = outcome(48_000, vec![log(&event)]);

        assert_eq!(
            extract::<ICryptoOperations::GasMeasuredOperations>(
                &outcome,
                CONTRACT,
                GasSource::Event
            ),
            Err(ExtractionError::GasOutOfRange("GasMeasuredOperations", U256::MAX))
        );
        // The receipt figure does not depend on the payload.
        let metered = extract::<ICryptoOperations::GasMeasuredOperations>(
            &outcome,
            CONTRACT,
            GasSource::Receipt,
        )
        .unwrap();
        assert_eq!(metered.gas(), 48_000);
    }
}
