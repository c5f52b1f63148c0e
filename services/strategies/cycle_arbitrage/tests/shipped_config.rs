use cycle_arbitrage::{load_pool_updates, ArbitrageConfig, ArbitrageDetector};
use pool_graph::PoolGraph;
use std::path::PathBuf;

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn shipped_config_matches_defaults_and_scans_scenario() {
    let config = ArbitrageConfig::from_file(config_dir().join("cycle_arbitrage.toml")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.curves, amm::CurveConfig::default());
    assert_eq!(config.optimizer, amm::SizingConfig::default());
    assert_eq!(config.gas, cycle_arbitrage::GasModel::default());

    let graph = PoolGraph::new();
    let updates = load_pool_updates(&config_dir().join("scenario_pools.json")).unwrap();
    assert!(graph.initialize_from_updates(updates).is_empty());

    let detector = ArbitrageDetector::new(config.detector_settings()).unwrap();
    let report = detector
        .run_pass(&graph.snapshot(), &config.pass_params())
        .unwrap();
    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(report.opportunities[0].hops(), 2);
}
