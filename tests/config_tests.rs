// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use device_preview::{BackendKind, Config};

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(
        config.backend,
        BackendKind::GStreamer,
        "GStreamer should be the default backend"
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_zero_capacity() {
    let config = Config {
        frame_channel_capacity: 0,
        ..Config::default()
    };
    assert!(
        config.validate().is_err(),
        "A frame channel without capacity cannot deliver frames"
    );
}

#[test]
fn test_config_rejects_zero_poll_interval() {
    let config = Config {
        ui_poll_interval_ms: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_partial_json_uses_defaults() {
    let config: Config = serde_json::from_str(r#"{"backend":"synthetic"}"#).unwrap();
    assert_eq!(config.backend, BackendKind::Synthetic);
    assert_eq!(
        config.frame_channel_capacity,
        Config::default().frame_channel_capacity
    );
}
