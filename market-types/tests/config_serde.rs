use market_types::{EngineConfig, Provider, ProviderRateLimit};

#[test]
fn provider_rate_limit_roundtrip() {
    let limit = ProviderRateLimit::new(5.0, 1.0 / 12.0);
    let json = serde_json::to_string(&limit).expect("serialize provider rate limit");
    let de: ProviderRateLimit = serde_json::from_str(&json).expect("deserialize provider rate limit");
    assert!((de.capacity - 5.0).abs() < f64::EPSILON);
    assert!((de.refill_per_second - 1.0 / 12.0).abs() < 1e-12);
}

#[test]
fn provider_default_limits_match_spec_table() {
    assert_eq!(Provider::GNews.default_limit().capacity, 3.0);
    assert_eq!(Provider::Fmp.default_limit().capacity, 5.0);
    assert_eq!(Provider::AlphaVantage.default_limit().capacity, 2.0);
    assert_eq!(Provider::Polygon.default_limit().capacity, 5.0);
    assert_eq!(Provider::Fred.default_limit().capacity, 10.0);
    assert_eq!(Provider::Yahoo.default_limit().capacity, 5.0);
}

#[test]
fn engine_config_defaults_are_sane() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.max_concurrent_sweeps, 3);
    assert_eq!(cfg.result_ttl.as_secs(), 7200);
    assert_eq!(cfg.sweep_inter_asset_pause.as_millis(), 300);
    assert!(cfg.gnews_key.is_none());
}

#[test]
fn engine_config_roundtrips_through_json() {
    let cfg = EngineConfig::default();
    let json = serde_json::to_string(&cfg).expect("serialize engine config");
    let de: EngineConfig = serde_json::from_str(&json).expect("deserialize engine config");
    assert_eq!(de.max_concurrent_sweeps, cfg.max_concurrent_sweeps);
    assert_eq!(de.result_ttl, cfg.result_ttl);
}
