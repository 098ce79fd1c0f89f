use super::*;
use crate::embedding::MockEmbedder;
use crate::vectordb::MockVectorIndex;

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(MockEmbedder::new(8))
}

fn index() -> Arc<dyn VectorIndex> {
    Arc::new(MockVectorIndex::new())
}

#[test]
fn test_build_requires_embedder() {
    let err = Engine::builder(Config::default())
        .index(index())
        .build()
        .expect_err("should reject missing embedder");
    assert!(matches!(
        err,
        ConfigError::MissingCollaborator { name: "embedder" }
    ));
}

#[test]
fn test_build_requires_index() {
    let err = Engine::builder(Config::default())
        .embedder(embedder())
        .build()
        .expect_err("should reject missing index");
    assert!(matches!(
        err,
        ConfigError::MissingCollaborator {
            name: "vector index"
        }
    ));
}

#[test]
fn test_build_validates_config() {
    let config = Config {
        generate_gate: 1.5,
        ..Config::default()
    };
    let err = Engine::builder(config)
        .embedder(embedder())
        .index(index())
        .build()
        .expect_err("should reject out-of-range gate");
    assert!(matches!(err, ConfigError::OutOfUnitRange { .. }));
}

#[test]
fn test_build_reports_unreadable_checklist() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("checklist.yaml");
    std::fs::write(&path, "sections: [not, a, mapping]").expect("should write");

    let config = Config {
        rules_path: Some(path.clone()),
        ..Config::default()
    };
    let err = Engine::builder(config)
        .embedder(embedder())
        .index(index())
        .build()
        .expect_err("should reject malformed checklist");
    assert!(matches!(err, ConfigError::InvalidRulesFile { path: p, .. } if p == path));
}

#[test]
fn test_build_loads_normalization_rules() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("rules.json");
    std::fs::write(&path, r#"{"tablet": ["tab"]}"#).expect("should write");

    let config = Config {
        normalization_path: Some(path),
        ..Config::default()
    };
    let engine = Engine::builder(config)
        .embedder(embedder())
        .index(index())
        .build();
    assert!(engine.is_ok());
}

#[tokio::test]
async fn test_validate_carries_configured_thresholds() {
    let config = Config {
        coverage_min: 0.5,
        generate_gate: 0.6,
        ..Config::default()
    };
    let engine = Engine::builder(config)
        .embedder(embedder())
        .index(index())
        .build()
        .expect("should build");

    let result = engine.validate("M2.3", "anything", false).await;
    assert_eq!(result.thresholds.coverage_min, 0.5);
    assert_eq!(result.thresholds.generate_gate, 0.6);
    assert!(!result.passed, "empty collections give no coverage");
}

#[tokio::test]
async fn test_generate_without_model_uses_offline_skeleton() {
    let engine = Engine::builder(Config::default())
        .embedder(embedder())
        .index(index())
        .build()
        .expect("should build");

    let artifact = engine
        .generate("M2.3", "content", OutputFormat::Markdown, None, &[])
        .await;
    assert!(artifact.offline_fallback.is_some());
    assert!(artifact.text.contains("NEED_INPUT"));
    assert!(!artifact.ready);
}
