use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

const ALL_VARS: [&str; 14] = [
    "NEUROKEY_EMBEDDING_DIM",
    "NEUROKEY_PROTOTYPE_K",
    "NEUROKEY_PROTOTYPE_METHOD",
    "NEUROKEY_KMEANS_SEED",
    "NEUROKEY_AGGREGATION",
    "NEUROKEY_AUTH_THRESHOLD",
    "NEUROKEY_TIER_HIGH",
    "NEUROKEY_TIER_MEDIUM",
    "NEUROKEY_SPOOF_PERCENTILE",
    "NEUROKEY_CALIBRATION_METHOD",
    "NEUROKEY_ARTIFACT_DIR",
    "NEUROKEY_PROTOTYPES_PATH",
    "NEUROKEY_CALIBRATOR_PATH",
    "NEUROKEY_SPOOF_MODEL_PATH",
];

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_neurokey_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for key in ALL_VARS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.embedding_dim, 128);
    assert_eq!(config.prototype_k, 2);
    assert_eq!(config.prototype_method, PrototypeMethod::KMeans);
    assert_eq!(config.aggregation, Aggregation::Max);
    assert_eq!(config.auth_threshold, 0.5);
    assert_eq!(config.spoof_percentile, 99.0);
    assert_eq!(config.calibration_method, CalibrationMethod::Platt);
    assert_eq!(config.artifact_dir, PathBuf::from("./models"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_artifact_paths_derive_from_dir() {
    let config = Config {
        artifact_dir: PathBuf::from("/srv/neurokey"),
        calibrator_path: Some(PathBuf::from("/etc/cal.nkaf")),
        ..Default::default()
    };

    assert_eq!(
        config.prototypes_artifact(),
        PathBuf::from("/srv/neurokey/prototypes.nkaf")
    );
    assert_eq!(config.calibrator_artifact(), PathBuf::from("/etc/cal.nkaf"));
    assert_eq!(
        config.spoof_artifact(),
        PathBuf::from("/srv/neurokey/spoof_detector.nkaf")
    );
}

#[test]
fn test_component_configs() {
    let config = Config {
        embedding_dim: 256,
        prototype_k: 3,
        kmeans_seed: 7,
        spoof_percentile: 95.0,
        ..Default::default()
    };

    let protos = config.prototype_config();
    assert_eq!((protos.k, protos.seed), (3, 7));
    assert_eq!(config.autoencoder_config().input_dim, 256);
    assert_eq!(config.training_config().percentile, 95.0);
    assert_eq!(config.decision_config().auth_threshold, 0.5);
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_neurokey_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.embedding_dim, 128);
    assert_eq!(config.prototype_k, 2);
    assert!(config.prototypes_path.is_none());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_neurokey_env();

    with_env_vars(
        &[
            ("NEUROKEY_PROTOTYPE_K", "4"),
            ("NEUROKEY_PROTOTYPE_METHOD", "median"),
            ("NEUROKEY_AGGREGATION", "mean"),
            ("NEUROKEY_AUTH_THRESHOLD", "0.7"),
            ("NEUROKEY_CALIBRATION_METHOD", "isotonic"),
            ("NEUROKEY_ARTIFACT_DIR", "/var/lib/neurokey"),
            ("NEUROKEY_SPOOF_MODEL_PATH", "/models/ae.nkaf"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.prototype_k, 4);
            assert_eq!(config.prototype_method, PrototypeMethod::Median);
            assert_eq!(config.aggregation, Aggregation::Mean);
            assert_eq!(config.auth_threshold, 0.7);
            assert_eq!(config.calibration_method, CalibrationMethod::Isotonic);
            assert_eq!(
                config.prototypes_artifact(),
                PathBuf::from("/var/lib/neurokey/prototypes.nkaf")
            );
            assert_eq!(config.spoof_artifact(), PathBuf::from("/models/ae.nkaf"));
        },
    );
}

#[test]
#[serial]
fn test_malformed_threshold_is_an_error() {
    clear_neurokey_env();

    with_env_vars(&[("NEUROKEY_AUTH_THRESHOLD", "high")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ParseError {
                name: "NEUROKEY_AUTH_THRESHOLD",
                ..
            }
        ));
        assert!(err.to_string().contains("high"));
    });
}

#[test]
#[serial]
fn test_unknown_aggregation_is_an_error() {
    clear_neurokey_env();

    with_env_vars(&[("NEUROKEY_AGGREGATION", "median")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    });
}

#[test]
#[serial]
fn test_negative_k_is_a_parse_error() {
    clear_neurokey_env();

    with_env_vars(&[("NEUROKEY_PROTOTYPE_K", "-1")], || {
        assert!(Config::from_env().is_err());
    });
}

#[test]
#[serial]
fn test_empty_override_path_is_ignored() {
    clear_neurokey_env();

    with_env_vars(&[("NEUROKEY_CALIBRATOR_PATH", "  ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.calibrator_path.is_none());
    });
}

#[test]
fn test_validate_rejects_bad_numbers() {
    let cases = [
        Config {
            embedding_dim: 0,
            ..Default::default()
        },
        Config {
            prototype_k: 0,
            ..Default::default()
        },
        Config {
            auth_threshold: 1.2,
            ..Default::default()
        },
        Config {
            tier_high: 0.55,
            tier_medium: 0.6,
            ..Default::default()
        },
        Config {
            spoof_percentile: 120.0,
            ..Default::default()
        },
        Config {
            spoof_percentile: f64::NAN,
            ..Default::default()
        },
    ];

    for config in cases {
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidValue { .. })),
            "{:?}",
            config
        );
    }
}

#[test]
fn test_validate_checks_path_kinds() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plain.txt");
    std::fs::write(&file, b"x").unwrap();

    let config = Config {
        artifact_dir: file.clone(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));

    let config = Config {
        artifact_dir: dir.path().to_path_buf(),
        prototypes_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NotAFile { .. })));

    // Artifacts that do not exist yet are fine.
    let config = Config {
        artifact_dir: dir.path().join("not-yet"),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}
