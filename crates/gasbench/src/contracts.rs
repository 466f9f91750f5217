//! ABI bindings for the benchmarked contracts.
//!
//! Argument order and tuple arity mirror the deployed contracts' calldata layout. Every event
//! carries a `gas` figure, which [`MeteredEvent`] exposes uniformly to the gas extractor.
#![allow(missing_docs)]

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolEvent};

sol! {
    #![sol(all_derives)]

    /// DDH proof attesting that `gamma` was derived from the prover key and the request seed.
    struct DdhProof {
        uint256[2] pk;
        uint256[2] gamma;
        uint256 c;
        uint256 s;
        uint256 seed;
        address uWitness;
        uint256[2] cGammaWitness;
        uint256[2] sHashWitness;
        uint256 zInv;
    }

    /// Request input echoed back on fulfillment.
    struct VrfInput {
        bytes32 x;
        uint256 reqid;
    }

    /// Client-keyed input of the instant VRF.
    struct ClientInput {
        uint256[2] pk;
        bytes32 e;
        uint256 reqid;
    }

    /// Single-party DDH VRF.
    interface IVrf {
        event ReqGen(uint256 reqid, uint256 gas);
        event ReqFulf(uint256 reqid, uint256 gas);

        function set_pk(uint256[2] pk) external;
        function req(bytes32 x) external;
        function _hash_gamma_to_y(uint256[2] gamma) external view returns (bytes32 y);
        function fulf(VrfInput x, bytes32 y, DdhProof pi) external;
    }

    /// Distributed (threshold BLS) VRF.
    interface IDvrf {
        event ReqGen(uint256 reqid, uint256 gas);
        event ReqFulf(uint256 reqid, uint256 gas);

        function set_pk(uint256[4] pk) external;
        function req(bytes32 x) external;
        function _hash_proof(uint256[2] pi) external view returns (bytes32 y);
        function fulf(VrfInput x, bytes32 y, uint256[2] pi) external;
    }

    /// Two-phase instant VRF.
    interface IInstaRand {
        event KeyRegistered(uint256 reqid, uint256 gas);
        event Prever(uint256 reqid, uint256 gas);
        event Ver(uint256 reqid, uint256 gas);

        function set_pk(uint256[4] pk) external;
        function register_client_key(bytes32 e, uint256[2] pk_c) external;
        function pre_ver(ClientInput x, uint256[2] sig) external;
        function _hash_gamma_to_y(uint256[2] gamma) external view returns (bytes32 y);
        function fulfill(ClientInput x, uint256 i, bytes32 w_i, DdhProof pi_i) external;
    }

    /// Blinded ("flexible") randomness protocol.
    interface IFlexiRand {
        event ReqGen(uint256 reqid, uint256 gas);
        event BlindedInputSubmitted(uint256 reqid, uint256 gas);
        event Prever(uint256 reqid, uint256 gas);
        event Ver(uint256 reqid, uint256 gas);

        function set_pk(uint256[4] pk) external;
        function gen_req(bytes32 e) external;
        function submit_blinding(VrfInput x, uint256[2] x_blind, uint256[2] proof) external;
        function pre_ver(uint256 reqid, uint256[2] y_blind) external;
        function _hash_proof(uint256[2] pi) external view returns (bytes32 y);
        function fulf(VrfInput x, bytes32 y, uint256[2] pi) external;
    }

    /// Primitive cryptographic operations, each metered by an inner gas counter.
    interface ICryptoOperations {
        event GasMeasuredOperations(uint256 gas);

        function _hash_gamma_to_y(uint256[2] gamma) external view returns (bytes32 y);
        function bench_secp256k1_hash_to_curve(uint256[2] pk, uint256 y) external;
        function bench_ddh_vrf_ver(bytes32 inp, bytes32 y, uint256[2] pk, DdhProof pi) external;
        function bench_bn254_hash_to_curve(bytes32 domain, bytes32 msg) external;
        function bench_bls_vrf_ver_str(bytes32 y, bytes32 domain, bytes32 inp, uint256[4] pk, uint256[2] sig) external;
        function bench_bls_verify_pairing(uint256[2] inp, uint256[4] pk, uint256[2] sig) external;
        function bench_bls_sig_ver_str(bytes32 domain, bytes32 inp, uint256[4] pk, uint256[2] sig) external;
    }

    /// Storage primitives keyed by a contract-assigned nonce.
    interface IStorageOperations {
        event GasMeasuredOperations(uint256 gas, uint256 nonce);

        function bench_increment_nonce() external;
        function bench_store_hash(uint256 nonce, bytes32 hash) external;
        function bench_delete_commitment(uint256 nonce) external;
        function bench_hash_and_store(uint256 nonce, bytes32 inp) external;
        function bench_store_ecp(uint256 nonce, uint256[2] ecp) external;
    }
}

/// An event that reports the gas of the segment it was emitted from.
pub trait MeteredEvent: SolEvent {
    /// Short event name used in diagnostics.
    const NAME: &'static str;

    /// Gas figure carried in the event payload.
    fn gas(&self) -> U256;
}

/// An event that hands a contract-assigned identifier to later steps of the same flow.
pub trait KeyedEvent: MeteredEvent {
    /// The request identifier (or storage nonce) assigned by the contract.
    fn key(&self) -> U256;
}

macro_rules! metered {
    ($($event:path => $name:literal),* $(,)?) => {
        $(
            impl MeteredEvent for $event {
                const NAME: &'static str = $name;

                fn gas(&self) -> U256 {
                    self.gas
                }
            }
        )*
    };
}

macro_rules! keyed {
    ($($event:path => $field:ident),* $(,)?) => {
        $(
            impl KeyedEvent for $event {
                fn key(&self) -> U256 {
                    self.$field
                }
            }
        )*
    };
}

metered! {
    IVrf::ReqGen => "ReqGen",
    IVrf::ReqFulf => "ReqFulf",
    IDvrf::ReqGen => "ReqGen",
    IDvrf::ReqFulf => "ReqFulf",
    IInstaRand::KeyRegistered => "KeyRegistered",
    IInstaRand::Prever => "Prever",
    IInstaRand::Ver => "Ver",
    IFlexiRand::ReqGen => "ReqGen",
    IFlexiRand::BlindedInputSubmitted => "BlindedInputSubmitted",
    IFlexiRand::Prever => "Prever",
    IFlexiRand::Ver => "Ver",
    ICryptoOperations::GasMeasuredOperations => "GasMeasuredOperations",
    IStorageOperations::GasMeasuredOperations => "GasMeasuredOperations",
}

keyed! {
    IVrf::ReqGen => reqid,
    IDvrf::ReqGen => reqid,
    IInstaRand::KeyRegistered => reqid,
    IFlexiRand::ReqGen => reqid,
    IStorageOperations::GasMeasuredOperations => nonce,
}
