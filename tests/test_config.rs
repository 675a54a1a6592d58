use std::collections::HashMap;
use std::path::PathBuf;

use rawhttp::config::Config;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.port, 42069);
    assert_eq!(cfg.assets_dir, PathBuf::from("./assets"));
    assert_eq!(cfg.upstream_url, "http://httpbin.org");
    assert_eq!(cfg.max_request_bytes, 1024 * 1024);
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        "port: 8080\nassets_dir: /srv/assets\nupstream_url: http://127.0.0.1:9000\n",
    )
    .unwrap();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.assets_dir, PathBuf::from("/srv/assets"));
    assert_eq!(cfg.upstream_url, "http://127.0.0.1:9000");
    // Missing keys keep their defaults.
    assert_eq!(cfg.max_request_bytes, 1024 * 1024);
}

#[test]
fn test_config_invalid_yaml() {
    assert!(Config::from_yaml_str("port: not-a-port\n").is_err());
}

#[test]
fn test_config_missing_file() {
    assert!(Config::from_yaml_file("/nonexistent/rawhttp.yaml").is_err());
}

#[test]
fn test_config_env_overrides() {
    let mut cfg = Config::from_yaml_str("port: 8080\n").unwrap();
    cfg.apply_overrides(env(&[
        ("PORT", "3000"),
        ("ASSETS_DIR", "/tmp/media"),
        ("MAX_REQUEST_BYTES", "4096"),
    ]));

    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.assets_dir, PathBuf::from("/tmp/media"));
    assert_eq!(cfg.max_request_bytes, 4096);
    assert_eq!(cfg.upstream_url, "http://httpbin.org");
}

#[test]
fn test_config_invalid_override_is_ignored() {
    let mut cfg = Config::default();
    cfg.apply_overrides(env(&[("PORT", "99999"), ("MAX_REQUEST_BYTES", "lots")]));

    assert_eq!(cfg, Config::default());
}

#[test]
fn test_config_upstream_url() {
    let cfg = Config::default();
    assert_eq!(cfg.upstream().unwrap().host_str(), Some("httpbin.org"));

    let mut bad = Config::default();
    bad.apply_overrides(env(&[("UPSTREAM_URL", "not a url")]));
    assert!(bad.upstream().is_err());
}
