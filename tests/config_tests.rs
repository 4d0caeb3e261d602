//! Configuration file loading tests

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use bootstrapper::{BootstrapConfig, ConfigError, SubsystemDescriptor, SystemDescriptor};

const BOOT_TOML: &str = r#"
boot_environment = "splash"
system_environment = "services"

[[systems]]
template = "audio"
name = "AudioSystem"

[[systems]]
template = "input"
name = "InputSystem"

[[subsystems]]
template = "audio-mixer"
system = "AudioSystem"

[logging]
filter = "bootstrapper=debug"
json_format = true
"#;

#[test]
fn test_load_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(BOOT_TOML.as_bytes()).unwrap();

    let config = BootstrapConfig::from_toml_file(file.path()).unwrap();

    assert_eq!(config.boot_environment, "splash");
    assert_eq!(config.system_environment, "services");
    assert_eq!(config.post_boot_environment, None);
    assert_eq!(
        config.systems,
        vec![
            SystemDescriptor::new("audio", "AudioSystem"),
            SystemDescriptor::new("input", "InputSystem"),
        ]
    );
    assert_eq!(
        config.subsystems,
        vec![SubsystemDescriptor::new("audio-mixer", "AudioSystem")]
    );
    assert!(config.logging.as_ref().unwrap().json_format);
    config.validate().unwrap();
}

#[test]
fn test_json_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boot.json");

    let config = BootstrapConfig::from_toml_str(BOOT_TOML).unwrap();
    config.to_json_file(&path).unwrap();

    let loaded = BootstrapConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded.systems, config.systems);
    assert_eq!(loaded.subsystems, config.subsystems);
    assert_eq!(loaded.boot_environment, "splash");

    // from_file picks the format from the extension
    let by_extension = BootstrapConfig::from_file(&path).unwrap();
    assert_eq!(by_extension.system_environment, "services");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(BootstrapConfig::from_toml_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let result = BootstrapConfig::from_toml_str("[[systems]]\ntemplate = 3\n");
    assert!(result.is_err());
}

#[test]
fn test_loaded_file_still_needs_validation() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[systems]]
template = "a"
name = "Same"

[[systems]]
template = "b"
name = "Same"
"#
    )
    .unwrap();

    let config = BootstrapConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(
        config.validate(),
        Err(ConfigError::DuplicateSystemName("Same".into()))
    );
}
