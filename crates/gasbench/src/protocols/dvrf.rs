//! Distributed VRF: request, then fulfill with a combined BLS proof.

use super::{observe, DriverContext, Protocol, ProtocolDriver, VrfRequested};
use crate::{client::ChainClient, contracts::IDvrf, error::StepError, metrics::Aggregator};

const REQUEST: &str = "request";
const FULFILL: &str = "fulfill";

pub(crate) const DVRF_OPERATIONS: &[&str] = &[REQUEST, FULFILL];

/// Drives `Idle -> Requested(reqid) -> Fulfilled` against the threshold contract.
#[derive(Debug)]
pub struct DvrfDriver<'a, C> {
    cx: DriverContext<'a, C>,
}

impl<'a, C: ChainClient> DvrfDriver<'a, C> {
    /// Creates a driver.
    pub const fn new(cx: DriverContext<'a, C>) -> Self {
        Self { cx }
    }

    /// Submits a fresh request.
    pub async fn request(
        &mut self,
        run: usize,
        metrics: &mut Aggregator,
    ) -> Result<VrfRequested, StepError> {
        let x = self.cx.inputs.random_b256();
        let metered = self
            .cx
            .measure::<IDvrf::ReqGen, _>(run, &IDvrf::reqCall { x }, metrics, REQUEST)
            .await?;
        Ok(VrfRequested { x, reqid: metered.key() })
    }

    /// Fulfills `requested` with a random proof point and the output the contract hashes it to.
    pub async fn fulfill(
        &mut self,
        run: usize,
        requested: VrfRequested,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let pi = self.cx.inputs.random_field_tuple();
        let y = self.cx.contract.read(&IDvrf::_hash_proofCall { pi }).await?.y;

        let call = IDvrf::fulfCall { x: requested.into(), y, pi };
        self.cx.measure::<IDvrf::ReqFulf, _>(run, &call, metrics, FULFILL).await?;
        Ok(())
    }
}

impl<C: ChainClient> ProtocolDriver for DvrfDriver<'_, C> {
    const PROTOCOL: Protocol = Protocol::Dvrf;

    async fn prepare(&mut self) {
        let pk = self.cx.inputs.random_field_tuple();
        self.cx.setup("set_pk", &IDvrf::set_pkCall { pk }).await;
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
