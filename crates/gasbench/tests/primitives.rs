//! Primitive crypto and storage operations.

use std::collections::HashSet;

use alloy_sol_types::SolCall;
use gasbench::{
    contracts::{ICryptoOperations, IStorageOperations},
    protocols::{CryptoOperation, Protocol},
    test_utils::MockChain,
    GasSource, Report, RunConfig, Runner,
};

async fn run(chain: &MockChain, protocol: Protocol, runs: usize) -> Report {
    let book = chain.deploy_all();
    let config = RunConfig { runs, protocols: vec![protocol], seed: Some(3), ..Default::default() };
    Runner::new(chain, &book, config).run().await.unwrap()
}

#[tokio::test]
async fn crypto_operations_report_metered_gas() {
    let chain = MockChain::default();
    let report = run(&chain, Protocol::CryptoOperations, 5).await;
    let crypto = report.protocol(Protocol::CryptoOperations).unwrap();

    assert_eq!(crypto.gas_source, GasSource::Event);
    let names = crypto.operations.iter().map(|s| s.operation).collect::<Vec<_>>();
    assert_eq!(names, CryptoOperation::ALL.map(CryptoOperation::name));

    let expected = [28_000, 95_000, 35_000, 140_000, 113_000, 130_000];
    for (stats, gas) in crypto.operations.iter().zip(expected) {
        assert_eq!(stats.series, vec![gas; 5], "{}", stats.operation);
        assert_eq!(stats.total, gas * 5);
    }
}

#[tokio::test]
async fn crypto_operations_run_interleaved_on_distinct_accounts() {
    let chain = MockChain::default();
    run(&chain, Protocol::CryptoOperations, 5).await;
    let journal = chain.journal();

    let selectors = [
        ICryptoOperations::bench_secp256k1_hash_to_curveCall::SELECTOR,
        ICryptoOperations::bench_ddh_vrf_verCall::SELECTOR,
        ICryptoOperations::bench_bn254_hash_to_curveCall::SELECTOR,
        ICryptoOperations::bench_bls_vrf_ver_strCall::SELECTOR,
        ICryptoOperations::bench_bls_verify_pairingCall::SELECTOR,
        ICryptoOperations::bench_bls_sig_ver_strCall::SELECTOR,
    ];
    let mut senders = HashSet::new();
    for selector in selectors {
        let from = journal
            .iter()
            .filter(|tx| tx.selector == selector)
            .map(|tx| tx.from)
            .collect::<HashSet<_>>();
        assert_eq!(from.len(), 1);
        senders.extend(from);
    }
    assert_eq!(senders.len(), 6);

    let positions = |selector| {
        journal.iter().enumerate().filter(move |(_, tx)| tx.selector == selector).map(|(i, _)| i)
    };
    let last_first = positions(selectors[0]).max().unwrap();
    let first_last = positions(selectors[5]).min().unwrap();
    assert!(first_last < last_first);
}

#[tokio::test]
async fn crypto_operation_failure_stays_local() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let crypto = book.address(Protocol::CryptoOperations).unwrap();
    chain.fail_nth::<ICryptoOperations::bench_ddh_vrf_verCall>(crypto, 2);
    let config = RunConfig {
        runs: 4,
        protocols: vec![Protocol::CryptoOperations],
        ..Default::default()
    };

    let report = Runner::new(&chain, &book, config).run().await.unwrap();
    let samples = report
        .protocol(Protocol::CryptoOperations)
        .unwrap()
        .operations
        .iter()
        .map(|s| s.samples)
        .collect::<Vec<_>>();

    assert_eq!(samples, [4, 3, 4, 4, 4, 4]);
}

#[tokio::test]
async fn storage_operations_thread_the_nonce() {
    let chain = MockChain::default();
    let report = run(&chain, Protocol::StorageOperations, 10).await;
    let storage = report.protocol(Protocol::StorageOperations).unwrap();

    let figures = storage.operations.iter().map(|s| (s.operation, s.series[0])).collect::<Vec<_>>();
    assert_eq!(
        figures,
        [
            ("increment_nonce", 5_000),
            ("store_hash", 22_100),
            ("hash_inp_and_store", 22_300),
            ("delete_data_from_mapping", 2_900),
            ("store_bn254_g1_element_in_mapping", 44_200),
        ]
    );
    assert!(storage.operations.iter().all(|s| s.samples == 10));
}

#[tokio::test]
async fn storage_operations_without_nonce_skip_the_iteration() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let storage = book.address(Protocol::StorageOperations).unwrap();
    chain.fail_nth::<IStorageOperations::bench_increment_nonceCall>(storage, 3);
    chain.drop_event_nth::<IStorageOperations::bench_delete_commitmentCall>(storage, 1);
    let config = RunConfig {
        runs: 5,
        protocols: vec![Protocol::StorageOperations],
        ..Default::default()
    };

    let report = Runner::new(&chain, &book, config).run().await.unwrap();
    let samples = report
        .protocol(Protocol::StorageOperations)
        .unwrap()
        .operations
        .iter()
        .map(|s| (s.operation, s.samples))
        .collect::<Vec<_>>();

    assert_eq!(
        samples,
        [
            ("increment_nonce", 4),
            ("store_hash", 4),
            ("hash_inp_and_store", 4),
            ("delete_data_from_mapping", 3),
            ("store_bn254_g1_element_in_mapping", 4),
        ]
    );
    assert_eq!(chain.transactions::<IStorageOperations::bench_store_hashCall>(storage).len(), 4);
}
