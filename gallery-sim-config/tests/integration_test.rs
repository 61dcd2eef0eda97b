//! Integration tests for gallery-sim-config

use gallery_sim_config::domains::logging::{LogFormat, LogLevel};
use gallery_sim_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_requires_existing_images_dir() {
    let config = SimulatorConfig::default();
    // ./test-images is not present in the crate directory
    assert!(config.validate_all().is_err());
}

#[test]
fn test_config_loader_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_str().unwrap().to_string();

    let vars = vec![
        ("GALLERY_SIM_IMAGES_DIR", Some(dir_str.as_str())),
        ("GALLERY_SIM_USERS", Some("4")),
        ("GALLERY_SIM_CYCLE_DURATION", Some("30")),
        ("GALLERY_SIM_MAX_RETRIES", Some("5")),
        ("GALLERY_SIM_BACKOFF_FACTOR", Some("0.5")),
        ("GALLERY_SIM_LOG_LEVEL", Some("debug")),
        ("GALLERY_SIM_BASE_URL", Some("http://localhost:8080")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new()
            .load_unvalidated(None::<&str>)
            .unwrap();
        config.validate_all().unwrap();

        assert_eq!(config.workload.users, 4);
        assert_eq!(config.workload.cycle_duration, Duration::from_secs(30));
        assert_eq!(config.pool.max_retries, 5);
        assert_eq!(config.pool.backoff_factor, 0.5);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.target.base_url, "http://localhost:8080");
        assert_eq!(config.effective_pool_capacity(), 10);
    });
}

#[test]
fn test_negative_retries_from_env_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_str().unwrap().to_string();

    let vars = vec![
        ("GALLERY_SIM_IMAGES_DIR", Some(dir_str.as_str())),
        ("GALLERY_SIM_MAX_RETRIES", Some("-1")),
    ];

    with_vars(vars, || {
        let err = ConfigLoader::new()
            .load_unvalidated(None::<&str>)
            .unwrap_err();
        assert!(err.to_string().contains("max_retries cannot be negative"));
    });
}

#[test]
fn test_unparseable_env_value() {
    with_vars(vec![("GALLERY_SIM_USERS", Some("many"))], || {
        let err = ConfigLoader::new()
            .load_unvalidated(None::<&str>)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });
}

#[test]
fn test_yaml_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        r#"
target:
  base_url: "http://gallery.local:9000"
  upload_timeout: 45s
workload:
  images_dir: "{}"
  cycle_duration: 5m
  max_cycles: 3
  users: 6
  upload_probability: 0.5
  action_interval: 500ms
pool:
  capacity: 24
  max_retries: 2
  backoff_factor: 0.1
logging:
  level: warn
  format: json
"#,
        dir.path().display()
    );

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    // Serialized with the env tests; no overrides may leak into the file values
    let config = with_vars(
        vec![
            ("GALLERY_SIM_BASE_URL", None::<&str>),
            ("GALLERY_SIM_USERS", None),
            ("GALLERY_SIM_MAX_RETRIES", None),
            ("GALLERY_SIM_LOG_LEVEL", None),
        ],
        || {
            ConfigLoader::new()
                .load_unvalidated(Some(file.path()))
                .unwrap()
        },
    );
    config.validate_all().unwrap();

    assert_eq!(config.target.base_url, "http://gallery.local:9000");
    assert_eq!(config.target.upload_timeout, Duration::from_secs(45));
    assert_eq!(config.target.page_timeout, Duration::from_secs(30));
    assert_eq!(config.workload.cycle_duration, Duration::from_secs(300));
    assert_eq!(config.workload.max_cycles, Some(3));
    assert_eq!(config.workload.action_interval, Duration::from_millis(500));
    assert_eq!(config.effective_pool_capacity(), 24);
    assert_eq!(config.pool.retry_statuses, vec![429, 500, 502, 503, 504]);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_sample_config_round_trips() {
    let sample = SimulatorConfig::generate_sample();
    let parsed: SimulatorConfig = serde_yaml::from_str(&sample).unwrap();
    assert_eq!(parsed.workload.users, 1);
    assert_eq!(parsed.pool.max_retries, 3);
}
