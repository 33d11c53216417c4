//! Smoke test that every layer's public surface links together.

#![allow(clippy::unwrap_used, clippy::no_effect_underscore_binding)]

#[test]
fn domain_crate_compiles() {
    let _provider = carmart_domain::ProviderId::Dummy;
    let _pair = carmart_domain::TokenPair::new("a", "r");
    assert!(carmart_domain::jwt::is_expiring_soon("not-a-jwt", 300, chrono::Utc::now()));
}

#[test]
fn application_crate_compiles() {
    let _settings = carmart_application::AuthSettings::default();
}

#[test]
fn infrastructure_crate_compiles() {
    use carmart_application::ports::Clock;
    let clock = carmart_infrastructure::SystemClock::new();
    let _now = clock.now();
    let _settings = carmart_infrastructure::Settings::default().registry().unwrap();
}
