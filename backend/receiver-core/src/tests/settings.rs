// Unit tests for receiver settings

use crate::error::SettingsError;
use crate::settings::ReceiverSettings;

use std::time::Duration;

/// **VALUE**: Verifies that a missing settings file yields defaults.
///
/// **WHY THIS MATTERS**: Most hosts never write a settings file.
///
/// **BUG THIS CATCHES**: Would catch `load` erroring on first run.
#[test]
fn given_missing_file_when_loaded_then_defaults_returned() {
    let dir = tempfile::tempdir().unwrap();

    let settings = ReceiverSettings::load(dir.path()).unwrap();

    assert_eq!(settings, ReceiverSettings::default());
    assert_eq!(settings.listen_options().socket_timeout, None);
}

/// **VALUE**: Verifies humantime durations parse and reach the listen options.
///
/// **WHY THIS MATTERS**: Socket timeouts are forwarded to the listen client untouched.
///
/// **BUG THIS CATCHES**: Would catch durations parsed in the wrong unit.
#[test]
fn given_humantime_values_when_loaded_then_listen_options_carry_them() {
    // GIVEN: A settings file with both durations
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("receiver.json"),
        r#"{ "socket_timeout": "30s", "socket_keep_alive_delay": "15m" }"#,
    )
    .unwrap();

    // WHEN: Loading
    let options = ReceiverSettings::load(dir.path()).unwrap().listen_options();

    // THEN: Both durations are present
    assert_eq!(options.socket_timeout, Some(Duration::from_secs(30)));
    assert_eq!(options.socket_keep_alive_delay, Some(Duration::from_secs(900)));
}

/// **VALUE**: Verifies that a zero duration is rejected.
///
/// **WHY THIS MATTERS**: A zero socket timeout would make the listen client drop the
/// connection immediately.
///
/// **BUG THIS CATCHES**: Would catch validation being skipped on load.
#[test]
fn given_zero_timeout_when_loaded_then_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("receiver.json"), r#"{ "socket_timeout": "0s" }"#).unwrap();

    let result = ReceiverSettings::load(dir.path());

    assert!(matches!(result, Err(SettingsError::ValidationError { .. })));
}

/// **VALUE**: Verifies that saved settings load back identically.
///
/// **BUG THIS CATCHES**: Would catch a serializer that writes durations in a form the
/// deserializer cannot read.
#[test]
fn given_saved_settings_when_loaded_then_identical() {
    // GIVEN: Non-default settings saved to disk
    let dir = tempfile::tempdir().unwrap();
    let settings = ReceiverSettings {
        socket_timeout: Some(Duration::from_secs(45)),
        store_dir: Some(dir.path().join("store")),
        ..ReceiverSettings::default()
    };
    settings.save(dir.path()).unwrap();

    // WHEN: Loading
    let loaded = ReceiverSettings::load(dir.path()).unwrap();

    // THEN: Same values
    assert_eq!(loaded, settings);
    assert_eq!(loaded.resolved_store_dir(), Some(dir.path().join("store")));
}

/// **VALUE**: Verifies that garbage durations surface as parse errors.
///
/// **BUG THIS CATCHES**: Would catch unparsable values silently becoming `None`.
#[test]
fn given_bad_duration_when_loaded_then_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("receiver.json"),
        r#"{ "socket_timeout": "soon" }"#,
    )
    .unwrap();

    let result = ReceiverSettings::load(dir.path());

    assert!(matches!(result, Err(SettingsError::ParseError { .. })));
}
