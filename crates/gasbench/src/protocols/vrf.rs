//! Single-party DDH VRF: request, then fulfill with a proof whose output is derived on-chain.

use alloy_primitives::{B256, U256};

use super::{observe, DriverContext, Protocol, ProtocolDriver};
use crate::{
    client::ChainClient,
    contracts::{IVrf, VrfInput},
    error::StepError,
    metrics::Aggregator,
};

const REQUEST: &str = "request";
const FULFILL: &str = "fulfill";

pub(crate) const VRF_OPERATIONS: &[&str] = &[REQUEST, FULFILL];

/// A request the contract accepted; fulfillment must echo it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrfRequested {
    /// Original request input.
    pub x: B256,
    /// Identifier assigned by the contract.
    pub reqid: U256,
}

impl From<VrfRequested> for VrfInput {
    fn from(requested: VrfRequested) -> Self {
        Self { x: requested.x, reqid: requested.reqid }
    }
}

/// Drives `Idle -> Requested(reqid) -> Fulfilled`.
#[derive(Debug)]
pub struct VrfDriver<'a, C> {
    cx: DriverContext<'a, C>,
}

impl<'a, C: ChainClient> VrfDriver<'a, C> {
    /// Creates a driver.
    pub const fn new(cx: DriverContext<'a, C>) -> Self {
        Self { cx }
    }

    /// Submits a fresh request and returns the identifier the contract assigned.
    pub async fn request(
        &mut self,
        run: usize,
        metrics: &mut Aggregator,
    ) -> Result<VrfRequested, StepError> {
        let x = self.cx.inputs.random_b256();
        let metered = self
            .cx
            .measure::<IVrf::ReqGen, _>(run, &IVrf::reqCall { x }, metrics, REQUEST)
            .await?;
        Ok(VrfRequested { x, reqid: metered.key() })
    }

    /// Fulfills `requested` with a proof around a fresh gamma. The output value is derived from
    /// gamma by the contract itself, never synthesized.
    pub async fn fulfill(
        &mut self,
        run: usize,
        requested: VrfRequested,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let gamma = self.cx.inputs.random_field_tuple();
        let pi = self.cx.inputs.fixed_gamma_ddh_proof(gamma);
        let y = self.cx.contract.read(&IVrf::_hash_gamma_to_yCall { gamma }).await?.y;

        let call = IVrf::fulfCall { x: requested.into(), y, pi };
        self.cx.measure::<IVrf::ReqFulf, _>(run, &call, metrics, FULFILL).await?;
        Ok(())
    }
}

impl<C: ChainClient> ProtocolDriver for VrfDriver<'_, C> {
    const PROTOCOL: Protocol = Protocol::Vrf;

    async fn prepare(&mut self) {
        let pk = self.cx.inputs.random_field_tuple();
        self.cx.setup("set_pk", &IVrf::set_pkCall { pk }).await;
    }

    async fn run_iteration(&mut self, run: usize, metrics: &mut Aggregator) {
        let requested = self.request(run, metrics).await;
        let fulfilled = match observe(Self::PROTOCOL, REQUEST, run, requested) {
            Some(requested) => self.fulfill(run, requested, metrics).await,
            None => Err(StepError::Skipped(REQUEST)),
        };
        observe(Self::PROTOCOL, FULFILL, run, fulfilled);
    }
}
