//! Request/fulfill flows of the single-party and distributed VRF.

use alloy_primitives::B256;
use alloy_sol_types::SolCall;
use gasbench::{
    contracts::{IDvrf, IVrf},
    protocols::Protocol,
    test_utils::{receipt_gas, MockChain},
    AddressBook, GasSource, OperationStats, Report, RunConfig, Runner,
};

fn config(protocol: Protocol, runs: usize) -> RunConfig {
    RunConfig { runs, protocols: vec![protocol], seed: Some(7), ..Default::default() }
}

async fn run(chain: &MockChain, book: &AddressBook, config: RunConfig) -> Report {
    Runner::new(chain, book, config).run().await.unwrap()
}

fn stats<'a>(report: &'a Report, protocol: Protocol, operation: &str) -> &'a OperationStats {
    report.protocol(protocol).unwrap().operation(operation).unwrap()
}

#[tokio::test]
async fn ten_runs_fill_every_series() {
    let chain = MockChain::default();
    let book = chain.deploy_all();

    let report = run(&chain, &book, config(Protocol::Vrf, 10)).await;
    let request = stats(&report, Protocol::Vrf, "request");
    let fulfill = stats(&report, Protocol::Vrf, "fulfill");

    assert_eq!(report.protocol(Protocol::Vrf).unwrap().gas_source, GasSource::Receipt);
    for stats in [request, fulfill] {
        assert_eq!(stats.samples, 10);
        assert_eq!(stats.runs, (0..10).collect::<Vec<_>>());
        assert_eq!(stats.total, stats.series.iter().sum::<u64>());
        assert_eq!(stats.average, Some(stats.total as f64 / 10.0));
    }

    let request_calldata = IVrf::reqCall { x: B256::ZERO }.abi_encode().len();
    assert_eq!(request.series, vec![receipt_gas(request_calldata, 48_000); 10]);
    assert!(fulfill.series.iter().all(|&gas| gas > 180_000));
}

#[tokio::test]
async fn event_source_reports_inner_gas() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let config = RunConfig { gas_source: Some(GasSource::Event), ..config(Protocol::Vrf, 4) };

    let report = run(&chain, &book, config).await;

    assert_eq!(stats(&report, Protocol::Vrf, "request").series, vec![48_000; 4]);
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").series, vec![180_000; 4]);
}

#[tokio::test]
async fn rejected_fulfillment_leaves_a_single_gap() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let dvrf = book.address(Protocol::Dvrf).unwrap();
    chain.fail_nth::<IDvrf::fulfCall>(dvrf, 3);

    let report = run(&chain, &book, config(Protocol::Dvrf, 10)).await;
    let request = stats(&report, Protocol::Dvrf, "request");
    let fulfill = stats(&report, Protocol::Dvrf, "fulfill");

    assert_eq!(request.samples, 10);
    assert_eq!(fulfill.samples, 9);
    assert_eq!(fulfill.runs, vec![0, 1, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(fulfill.total, fulfill.series.iter().sum::<u64>());
    // A missing run lowers the average instead of being averaged away.
    assert_eq!(fulfill.average, Some(fulfill.total as f64 / 10.0));
    assert_eq!(fulfill.sample_mean, Some(fulfill.total as f64 / 9.0));

    let attempts = chain.transactions::<IDvrf::fulfCall>(dvrf);
    assert_eq!(attempts.len(), 10);
    assert_eq!(attempts.iter().filter(|tx| tx.reverted).count(), 1);
}

#[tokio::test]
async fn failed_request_skips_its_fulfillment() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let vrf = book.address(Protocol::Vrf).unwrap();
    chain.fail_nth::<IVrf::reqCall>(vrf, 2);

    let report = run(&chain, &book, config(Protocol::Vrf, 5)).await;

    assert_eq!(stats(&report, Protocol::Vrf, "request").runs, vec![0, 2, 3, 4]);
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").runs, vec![0, 2, 3, 4]);
    assert_eq!(chain.transactions::<IVrf::fulfCall>(vrf).len(), 4);
}

#[tokio::test]
async fn failed_output_derivation_skips_only_the_fulfillment() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let vrf = book.address(Protocol::Vrf).unwrap();
    chain.fail_nth::<IVrf::_hash_gamma_to_yCall>(vrf, 5);

    let report = run(&chain, &book, config(Protocol::Vrf, 6)).await;

    assert_eq!(stats(&report, Protocol::Vrf, "request").samples, 6);
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").runs, vec![0, 1, 2, 3, 5]);
    assert_eq!(chain.transactions::<IVrf::fulfCall>(vrf).len(), 5);
}

#[tokio::test]
async fn failed_setup_is_not_fatal() {
    let chain = MockChain::default();
    let book = chain.deploy_all();
    let vrf = book.address(Protocol::Vrf).unwrap();
    chain.fail_nth::<IVrf::set_pkCall>(vrf, 1);

    let report = run(&chain, &book, config(Protocol::Vrf, 3)).await;

    // Without a key every fulfillment is rejected, but requests are still measured.
    assert_eq!(stats(&report, Protocol::Vrf, "request").samples, 3);
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").samples, 0);
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").average, Some(0.0));
    assert_eq!(stats(&report, Protocol::Vrf, "fulfill").sample_mean, None);
}
