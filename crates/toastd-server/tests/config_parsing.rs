use std::{env, fs};

use toastd_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("toastd.toml");

    let toml_content = r#"
[logging]
level = "debug"

[center]
blur_toggle_block_ms = 500
toggle_blur_block_ms = 150

[expiry]
enabled = false

[events]
replay_limit = 25

[storage]
backend = "memory"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.center.blur_toggle_block_ms, 500);
    assert_eq!(cfg.toggle_blur_block().as_millis(), 150);
    assert!(!cfg.expiry.enabled);
    assert_eq!(cfg.events.replay_limit, 25);

    // 2) Env override should win over file
    unsafe {
        env::set_var("TOASTD__EVENTS__REPLAY_LIMIT", "50");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.events.replay_limit, 50);
    unsafe {
        env::remove_var("TOASTD__EVENTS__REPLAY_LIMIT");
    }

    // 3) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[center]
blur_toggle_block_ms = 0
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("block windows must be > 0"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let cfg = load_config(path.to_str()).expect("defaults should load");
    assert_eq!(cfg.center.blur_toggle_block_ms, 750);
    assert_eq!(cfg.center.toggle_blur_block_ms, 200);
    assert!(cfg.expiry.enabled);
}
