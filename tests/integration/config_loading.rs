//! Configuration file loading tests

use std::io::Write;
use std::time::Duration;

use ip_monitor::config::read_config_file;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"{
            "influx": {
                "host": "influx.example.org",
                "port": 8086,
                "login": "monitor",
                "password": "secret",
                "database": "network",
                "location": "office",
                "ssl": false,
                "timeout_secs": 10
            },
            "hosts": { "gateway": "10.0.0.1", "printer": "10.0.0.40" },
            "ping_frequency": 2
        }"#,
    );

    let config = read_config_file(file.path()).unwrap();

    assert_eq!(config.influx.location, "office");
    assert!(!config.influx.ssl);
    assert_eq!(config.influx.timeout_secs, 10);
    assert_eq!(config.hosts["printer"], "10.0.0.40");
    assert_eq!(config.loop_delay(), Duration::from_secs(120));
}

#[test]
fn test_malformed_json_is_rejected() {
    let file = write_config("{ not json");

    let err = read_config_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("invalid configuration file"));
}

#[test]
fn test_empty_address_is_rejected() {
    let file = write_config(
        r#"{
            "influx": {
                "host": "influx.example.org",
                "port": 8086,
                "login": "monitor",
                "password": "secret",
                "database": "network",
                "location": "office"
            },
            "hosts": { "gateway": "" },
            "ping_frequency": 1
        }"#,
    );

    let err = read_config_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("empty address"));
}

#[test]
fn test_directory_is_not_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_config_file(dir.path()).is_err());
}

fn config_with(influx_extra: &str, ping_frequency: &str) -> String {
    format!(
        r#"{{
            "influx": {{
                "host": "influx.example.org",
                "port": 8086,
                "login": "monitor",
                "password": "secret",
                "database": "network",
                "location": "office"{influx_extra}
            }},
            "hosts": {{ "gateway": "10.0.0.1" }},
            "ping_frequency": {ping_frequency}
        }}"#
    )
}

#[test]
fn test_certificate_verification_on_by_default() {
    let file = write_config(&config_with("", "1"));

    let config = read_config_file(file.path()).unwrap();
    assert!(config.influx.ssl);
    assert!(config.influx.verify_ssl);
}

#[test]
fn test_certificate_verification_can_be_disabled() {
    let file = write_config(&config_with(r#", "verify_ssl": false"#, "1"));

    let config = read_config_file(file.path()).unwrap();
    assert!(config.influx.ssl);
    assert!(!config.influx.verify_ssl);
}

#[test]
fn test_fractional_frequency() {
    let file = write_config(&config_with("", "0.5"));

    let config = read_config_file(file.path()).unwrap();
    assert_eq!(config.loop_delay(), Duration::from_secs(30));
}

#[test]
fn test_oversized_frequency_is_rejected() {
    let file = write_config(&config_with("", "1e300"));

    let err = read_config_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("ping_frequency"));
}

#[test]
fn test_negative_frequency_is_rejected() {
    let file = write_config(&config_with("", "-2"));

    let err = read_config_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("ping_frequency"));
}
