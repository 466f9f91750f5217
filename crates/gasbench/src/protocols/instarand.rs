//! Instant VRF: register a client key, pre-verify the client signature, then fulfill.
//!
//! Pre-verification records a partial commitment so the final fulfillment is cheaper. The
//! fulfillment only needs the registered input, so it still runs when pre-verification fails.

use alloy_primitives::U256;

use super::{observe, DriverContext, Protocol, ProtocolDriver};
use crate::{
    client::ChainClient,
    contracts::{ClientInput, IInstaRand},
    error::StepError,
    metrics::Aggregator,
};

const KEY_REG: &str = "key_reg";
const PRE_VER: &str = "pre_ver";
const INSTANT_VER: &str = "instant_ver";

pub(crate) const INSTARAND_OPERATIONS: &[&str] = &[KEY_REG, PRE_VER, INSTANT_VER];

/// Drives `Idle -> KeyRegistered(reqid) -> PreVerified -> Fulfilled`.
#[derive(Debug)]
pub struct InstaRandDriver<'a, C> {
    cx: DriverContext<'a, C>,
}

impl<'a, C: ChainClient> InstaRandDriver<'a, C> {
    /// Creates a driver.
    pub const fn new(cx: DriverContext<'a, C>) -> Self {
        Self { cx }
    }

    /// Registers a fresh client key and returns the input every later step must carry.
    pub async fn register_client_key(
        &mut self,
        run: usize,
        metrics: &mut Aggregator,
    ) -> Result<ClientInput, StepError> {
        let pk_c = self.cx.inputs.random_field_tuple();
        let e = self.cx.inputs.random_b256();
        let call = IInstaRand::register_client_keyCall { e, pk_c };
        let metered = self
            .cx
            .measure::<IInstaRand::KeyRegistered, _>(run, &call, metrics, KEY_REG)
            .await?;
        Ok(ClientInput { pk: pk_c, e, reqid: metered.key() })
    }

    /// Pre-verifies a client signature over the registered input.
    pub async fn pre_verify(
        &mut self,
        run: usize,
        input: &ClientInput,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let sig = self.cx.inputs.random_field_tuple();
        let call = IInstaRand::pre_verCall { x: input.clone(), sig };
        self.cx.measure::<IInstaRand::Prever, _>(run, &call, metrics, PRE_VER).await?;
        Ok(())
    }

    /// Fulfills the registered input as the `run`-th server evaluation.
    pub async fn fulfill(
        &mut self,
        run: usize,
        input: &ClientInput,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let gamma = self.cx.inputs.random_field_tuple();
        let pi_i = self.cx.inputs.fixed_gamma_ddh_proof(gamma);
        let w_i = self.cx.contract.read(&IInstaRand::_hash_gamma_to_yCall { gamma }).await?.y;

        let call = IInstaRand::fulfillCall { x: input.clone(), i: U256::from(run), w_i, pi_i };
        self.cx.measure::<IInstaRand::Ver, _>(run, &call, metrics, INSTANT_VER).await?;
        Ok(())
    }
}

impl<C: ChainClient> ProtocolDriver for InstaRandDriver<'_, C> {
    const PROTOCOL: Protocol = Protocol::InstaRand;

    async fn prepare(&mut self) {
        let pk = self.cx.inputs.random_field_tuple();
        self.cx.setup("set_pk", &IInstaRand::set_pkCall { pk }).await;
    }

    async fn run_iteration(&mut self, run: usize, metrics: &mut Aggregator) {
        let registered = self.register_client_key(run, metrics).await;
        let Some(input) = observe(Self::PROTOCOL, KEY_REG, run, registered) else {
            for step in [PRE_VER, INSTANT_VER] {
                observe::<()>(Self::PROTOCOL, step, run, Err(StepError::Skipped(KEY_REG)));
            }
            return;
        };

        let pre_verified = self.pre_verify(run, &input, metrics).await;
        observe(Self::PROTOCOL, PRE_VER, run, pre_verified);

        let fulfilled = self.fulfill(run, &input, metrics).await;
        observe(Self::PROTOCOL, INSTANT_VER, run, fulfilled);
    }
}
