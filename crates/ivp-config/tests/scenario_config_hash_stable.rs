//! Canonical hashing: same content → same hash regardless of key order;
//! different content → different hash.

use ivp_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
profile:
  window_days: 5
  interval_minutes: 5
  min_policy: zero_sentinel
ingest:
  instruments: ["000001.SH", "399001.SZ"]
  max_backfill_attempts: 1
"#;

const BASE_YAML_REORDERED: &str = r#"
ingest:
  max_backfill_attempts: 1
  instruments: ["000001.SH", "399001.SZ"]
profile:
  min_policy: zero_sentinel
  interval_minutes: 5
  window_days: 5
"#;

const OVERLAY_YAML: &str = r#"
profile:
  window_days: 10
live:
  refresh_lag_secs: 3
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_changes_hash_and_takes_effect() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged
            .config_json
            .pointer("/profile/window_days")
            .and_then(|v| v.as_u64()),
        Some(10)
    );
    assert_eq!(
        merged
            .config_json
            .pointer("/profile/interval_minutes")
            .and_then(|v| v.as_u64()),
        Some(5)
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn files_load_like_strings() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, OVERLAY_YAML).unwrap();

    let from_files = ivp_config::load_layered_yaml(&[
        base.to_str().unwrap(),
        overlay.to_str().unwrap(),
    ])
    .unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = ivp_config::load_layered_yaml(&["/nonexistent/ivp.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/ivp.yaml"));
}
