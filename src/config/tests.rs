use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

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

fn clear_sentinel_env() {
    const VARS: [&str; 20] = [
        "SENTINEL_QDRANT_URL",
        "SENTINEL_GUIDE_COLLECTION",
        "SENTINEL_REFERENCE_COLLECTION",
        "SENTINEL_GLOSSARY_COLLECTION",
        "SENTINEL_EMBED_URL",
        "SENTINEL_EMBED_MODEL",
        "SENTINEL_EMBED_DIM",
        "SENTINEL_EMBED_CACHE_CAPACITY",
        "SENTINEL_GENERATION_MODEL",
        "SENTINEL_RULES_PATH",
        "SENTINEL_NORMALIZATION_PATH",
        "SENTINEL_COVERAGE_MIN",
        "SENTINEL_CONFIDENCE_MIN",
        "SENTINEL_VIOLATION_MAX",
        "SENTINEL_GENERATE_GATE",
        "SENTINEL_LINT_MAX_MAJOR",
        "SENTINEL_GENERATE_READY_MIN",
        "SENTINEL_HYBRID_ALPHA",
        "SENTINEL_MMR_LAMBDA",
        "SENTINEL_LEXICAL",
    ];
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for var in VARS {
        unsafe { env::remove_var(var) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.guide_collection, "guidelines");
    assert_eq!(config.reference_collection, "combined_regulations");
    assert_eq!(config.glossary_collection, "glossary");
    assert!(config.embed_url.is_none());
    assert!(config.rules_path.is_none());
    assert_eq!(config.coverage_min, 0.70);
    assert_eq!(config.confidence_min, 0.40);
    assert_eq!(config.violation_max, 3);
    assert_eq!(config.generate_gate, 0.65);
    assert_eq!(config.lint_max_major, 0);
    assert_eq!(config.generate_ready_min, 0.70);
    assert_eq!(config.hybrid_alpha, 0.7);
    assert_eq!(config.mmr_lambda, 0.5);
    assert!(!config.lexical_enabled);
}

#[test]
fn test_default_config_validates() {
    Config::default()
        .validate()
        .expect("defaults should validate");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_sentinel_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_from_env_overrides_thresholds() {
    clear_sentinel_env();

    let config = with_env_vars(
        &[
            ("SENTINEL_COVERAGE_MIN", "0.55"),
            ("SENTINEL_CONFIDENCE_MIN", " 0.3 "),
            ("SENTINEL_VIOLATION_MAX", "5"),
            ("SENTINEL_GENERATE_GATE", "0.8"),
            ("SENTINEL_LINT_MAX_MAJOR", "2"),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.coverage_min, 0.55);
    assert_eq!(config.confidence_min, 0.3);
    assert_eq!(config.violation_max, 5);
    assert_eq!(config.generate_gate, 0.8);
    assert_eq!(config.lint_max_major, 2);
}

#[test]
#[serial]
fn test_from_env_overrides_collections_and_models() {
    clear_sentinel_env();

    let config = with_env_vars(
        &[
            ("SENTINEL_QDRANT_URL", "http://qdrant:6334"),
            ("SENTINEL_GUIDE_COLLECTION", "qos_guides"),
            ("SENTINEL_EMBED_URL", "http://embed:8000/v1"),
            ("SENTINEL_GENERATION_MODEL", "gpt-4o-mini"),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.guide_collection, "qos_guides");
    assert_eq!(config.embed_url.as_deref(), Some("http://embed:8000/v1"));
    assert_eq!(config.generation_model, "gpt-4o-mini");
}

#[test]
#[serial]
fn test_from_env_blank_embed_url_is_none() {
    clear_sentinel_env();

    let config = with_env_vars(&[("SENTINEL_EMBED_URL", "   ")], Config::from_env)
        .expect("should parse");

    assert!(config.embed_url.is_none());
}

#[test]
#[serial]
fn test_from_env_rejects_malformed_number() {
    clear_sentinel_env();

    let result = with_env_vars(&[("SENTINEL_VIOLATION_MAX", "three")], Config::from_env);

    match result {
        Err(ConfigError::InvalidNumber { name, value }) => {
            assert_eq!(name, "SENTINEL_VIOLATION_MAX");
            assert_eq!(value, "three");
        }
        other => panic!("expected InvalidNumber, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_from_env_lexical_toggle() {
    clear_sentinel_env();

    let config = with_env_vars(&[("SENTINEL_LEXICAL", "off")], Config::from_env)
        .expect("should parse toggle");
    assert!(!config.lexical_enabled);

    let config = with_env_vars(&[("SENTINEL_LEXICAL", "TRUE")], Config::from_env)
        .expect("should parse toggle");
    assert!(config.lexical_enabled);

    let result = with_env_vars(&[("SENTINEL_LEXICAL", "maybe")], Config::from_env);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidBool {
            name: "SENTINEL_LEXICAL",
            ..
        })
    ));
}

#[test]
fn test_validate_rejects_out_of_range_ratio() {
    let config = Config {
        hybrid_alpha: 1.5,
        ..Default::default()
    };

    let err = config.validate().expect_err("alpha above 1 should fail");
    assert!(matches!(
        err,
        ConfigError::OutOfUnitRange {
            name: "hybrid_alpha",
            ..
        }
    ));
}

#[test]
fn test_validate_rejects_empty_collection() {
    let config = Config {
        glossary_collection: "  ".to_string(),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyCollection {
            name: "glossary_collection"
        })
    ));
}

#[test]
fn test_validate_rejects_zero_dim() {
    let config = Config {
        embed_dim: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue { name: "embed_dim" })
    ));
}

#[test]
fn test_validate_rules_path_must_exist() {
    let config = Config {
        rules_path: Some(PathBuf::from("/definitely/not/here/rules.yaml")),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));
}

#[test]
fn test_validate_normalization_path_must_exist() {
    let config = Config {
        normalization_path: Some(PathBuf::from("/definitely/not/here/normalization.yaml")),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));
}

#[test]
fn test_validate_rules_path_must_be_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = Config {
        rules_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    assert!(matches!(config.validate(), Err(ConfigError::NotAFile { .. })));
}

#[test]
fn test_error_display() {
    let err = ConfigError::MissingCollaborator { name: "embedder" };
    assert_eq!(err.to_string(), "missing required collaborator: embedder");

    let err = ConfigError::OutOfUnitRange {
        name: "mmr_lambda",
        value: 2.0,
    };
    assert!(err.to_string().contains("mmr_lambda"));
}
