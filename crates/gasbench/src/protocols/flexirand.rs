//! Flexible randomness: the client blinds its input, the server pre-verifies the blinded
//! evaluation, and the unblinded output is verified last.

use alloy_primitives::U256;

use super::{observe, DriverContext, Protocol, ProtocolDriver};
use crate::{
    client::ChainClient,
    contracts::{IFlexiRand, VrfInput},
    error::StepError,
    metrics::Aggregator,
};

const REQ_GEN: &str = "req_gen";
const SUBMIT_BLINDING: &str = "submit_blinding";
const PRE_VER: &str = "pre_ver";
const VERIFY: &str = "verify";

pub(crate) const FLEXIRAND_OPERATIONS: &[&str] = &[REQ_GEN, SUBMIT_BLINDING, PRE_VER, VERIFY];

/// Drives `Idle -> RequestGenerated(reqid) -> BlindingSubmitted -> PreVerified -> Verified`.
#[derive(Debug)]
pub struct FlexiRandDriver<'a, C> {
    cx: DriverContext<'a, C>,
}

impl<'a, C: ChainClient> FlexiRandDriver<'a, C> {
    /// Creates a driver.
    pub const fn new(cx: DriverContext<'a, C>) -> Self {
        Self { cx }
    }

    /// Generates a request over a fresh input.
    pub async fn generate_request(
        &mut self,
        run: usize,
        metrics: &mut Aggregator,
    ) -> Result<VrfInput, StepError> {
        let e = self.cx.inputs.random_b256();
        let call = IFlexiRand::gen_reqCall { e };
        let metered =
            self.cx.measure::<IFlexiRand::ReqGen, _>(run, &call, metrics, REQ_GEN).await?;
        Ok(VrfInput { x: e, reqid: metered.key() })
    }

    /// Submits the blinded input and its blinding proof.
    pub async fn submit_blinding(
        &mut self,
        run: usize,
        input: &VrfInput,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let x_blind = self.cx.inputs.random_field_tuple();
        let proof = self.cx.inputs.random_field_tuple();
        let call = IFlexiRand::submit_blindingCall { x: input.clone(), x_blind, proof };
        self.cx
            .measure::<IFlexiRand::BlindedInputSubmitted, _>(run, &call, metrics, SUBMIT_BLINDING)
            .await?;
        Ok(())
    }

    /// Pre-verifies the blinded output of request `reqid`.
    pub async fn pre_verify(
        &mut self,
        run: usize,
        reqid: U256,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let y_blind = self.cx.inputs.random_field_tuple();
        let call = IFlexiRand::pre_verCall { reqid, y_blind };
        self.cx.measure::<IFlexiRand::Prever, _>(run, &call, metrics, PRE_VER).await?;
        Ok(())
    }

    /// Verifies the unblinded proof, with the output derived from it by the contract.
    pub async fn verify(
        &mut self,
        run: usize,
        input: &VrfInput,
        metrics: &mut Aggregator,
    ) -> Result<(), StepError> {
        let pi = self.cx.inputs.random_field_tuple();
        let y = self.cx.contract.read(&IFlexiRand::_hash_proofCall { pi }).await?.y;

        let call = IFlexiRand::fulfCall { x: input.clone(), y, pi };
        self.cx.measure::<IFlexiRand::Ver, _>(run, &call, metrics, VERIFY).await?;
        Ok(())
    }
}

impl<C: ChainClient> ProtocolDriver for FlexiRandDriver<'_, C> {
    const PROTOCOL: Protocol = Protocol::FlexiRand;

    async fn prepare(&mut self) {
        let pk = self.cx.inputs.random_field_tuple();
        self.cx.setup("set_pk", &IFlexiRand::set_pkCall { pk }).await;
    }

    async fn run_iteration(&mut self, run: usize, metrics: &mut Aggregator) {
        let generated = self.generate_request(run, metrics).await;
        let Some(input) = observe(Self::PROTOCOL, REQ_GEN, run, generated) else {
            for step in [SUBMIT_BLINDING, PRE_VER, VERIFY] {
                observe::<()>(Self::PROTOCOL, step, run, Err(StepError::Skipped(REQ_GEN)));
            }
            return;
        };

        let submitted = self.submit_blinding(run, &input, metrics).await;
        observe(Self::PROTOCOL, SUBMIT_BLINDING, run, submitted);

        let pre_verified = self.pre_verify(run, input.reqid, metrics).await;
        observe(Self::PROTOCOL, PRE_VER, run, pre_verified);

        let verified = self.verify(run, &input, metrics).await;
        observe(Self::PROTOCOL, VERIFY, run, verified);
    }
}
