//! End-to-end tests for `Engine::validate`, `Engine::retrieve` and the generation gate.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{approx, builder, engine_with_generator, seeded_index};
use sentinel::scoring::TermRule;
use sentinel::{
    CandidateMetadata, Config, Engine, MockEmbedder, MockGenerator, MockPoint, MockVectorIndex,
    OutputFormat, Severity, TermNormalizer,
};

#[tokio::test]
async fn test_well_supported_content_passes() {
    let engine = builder(seeded_index(0.9)).build().expect("should build engine");

    let result = engine
        .validate("2.3", "Drug substance specification and assay", false)
        .await;

    assert!(result.passed);
    assert!(approx(result.coverage, 0.862));
    assert!(approx(result.confidence, 0.85));
    assert!(approx(result.glossary_hit, 0.7));
    assert_eq!(result.violation_weight, 0);
    assert!(result.violations.is_empty());
    assert!(approx(result.score, 0.55 * 0.862 + 0.30 * 0.85 + 0.15 * 0.7));
    assert_eq!(result.score, result.score_raw);

    assert_eq!(result.citations.len(), 5);
    assert_eq!(result.citations[0].doc, "QOS guideline 0");
    assert!(
        result
            .citations
            .windows(2)
            .all(|w| w[0].score >= w[1].score)
    );
}

#[tokio::test]
async fn test_default_config_passes_strong_mfds_evidence() {
    let config = Config::default();
    let index = MockVectorIndex::new();
    for (i, score) in [0.95, 0.94, 0.93, 0.92, 0.91].into_iter().enumerate() {
        index.insert(
            &config.guide_collection,
            MockPoint::new(format!("mfds-{i}"), format!("MFDS QOS guidance {i}"))
                .with_score(score)
                .with_metadata(
                    CandidateMetadata::default()
                        .with_source("MFDS")
                        .with_module("M2.3")
                        .with_page(i as i64 + 1),
                ),
        );
    }
    let engine = Engine::builder(config)
        .embedder(Arc::new(MockEmbedder::new(16)))
        .index(Arc::new(index))
        .build()
        .expect("should build engine");

    let result = engine
        .validate("M2.3", "Drug substance specification and assay", false)
        .await;

    assert!(result.passed, "unexpected verdict: {result:?}");
    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.violation_weight, 0);
    assert!(approx(result.coverage, 0.6 * 0.93 + 0.4));
    assert!(approx(result.confidence, 0.94));
    assert!(approx(result.citations[0].score, 0.95));
}

#[tokio::test]
async fn test_heavy_violations_fail_despite_strong_evidence() {
    let engine = builder(seeded_index(0.7)).build().expect("should build engine");

    let result = engine
        .validate("M2.3", "Drug product composition TBD", false)
        .await;

    assert!(approx(result.coverage, 0.862));
    assert_eq!(result.violations.len(), 2);
    assert!(result.violations.iter().all(|v| v.severity == Severity::Major));
    assert_eq!(result.violation_weight, 4);
    assert!(!result.passed);
    assert!(approx(result.score, result.score_raw - 0.2));
}

#[tokio::test]
async fn test_auto_fix_normalizes_terms() {
    let normalizer =
        TermNormalizer::new(vec![TermRule::new("tablet", ["tab"])]).expect("valid rules");
    let engine = builder(seeded_index(0.9))
        .normalizer(normalizer)
        .build()
        .expect("should build engine");

    let result = engine.validate("M2.3", "Tab strength TBD", true).await;
    assert_eq!(result.normalized_content, "tablet strength TBD");

    let result = engine.validate("M2.3", "Tab strength TBD", false).await;
    assert_eq!(result.normalized_content, "Tab strength TBD");
}

#[tokio::test]
async fn test_retrieve_filters_by_module() {
    let engine = builder(seeded_index(0.9)).build().expect("should build engine");

    let hits = engine.retrieve("specification", Some("M2.3"), 3, false).await;
    let ids: Vec<&str> = hits.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["guide-0", "guide-1", "guide-2"]);

    assert!(engine.retrieve("specification", Some("M2.7"), 3, false).await.is_empty());
    assert!(engine.retrieve("specification", None, 0, false).await.is_empty());
}

#[tokio::test]
async fn test_retrieve_with_mmr_returns_unique_hits() {
    let engine = builder(seeded_index(0.9)).build().expect("should build engine");

    let hits = engine.retrieve("specification", Some("M2.3"), 4, true).await;
    let ids: HashSet<&str> = hits.iter().map(|h| h.id()).collect();

    assert_eq!(hits.len(), 4);
    assert_eq!(ids.len(), 4);
    assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.fused_score)));
}

#[tokio::test]
async fn test_gate_boundary_is_inclusive() {
    let generator = Arc::new(MockGenerator::new(common::VALID_DRAFT));
    let engine = engine_with_generator(seeded_index(0.9), generator.clone());

    let mut validation = engine.validate("M2.3", "Drug product", false).await;
    validation.passed = true;
    validation.score = engine.config().generate_gate;

    let artifact = engine
        .generate("M2.3", "Drug product", OutputFormat::Yaml, Some(&validation), &[])
        .await;
    assert!(!artifact.skipped);
    assert_eq!(generator.calls(), 1);

    validation.score = engine.config().generate_gate - 0.01;
    let artifact = engine
        .generate("M2.3", "Drug product", OutputFormat::Yaml, Some(&validation), &[])
        .await;
    assert!(artifact.skipped);
    assert_eq!(generator.calls(), 1, "closed gate never calls the generator");
}

#[tokio::test]
async fn test_generation_without_validation_is_allowed() {
    let generator = Arc::new(MockGenerator::new(common::VALID_DRAFT));
    let engine = engine_with_generator(seeded_index(0.9), generator.clone());

    let artifact = engine
        .generate("M2.3", "Drug product", OutputFormat::Yaml, None, &[])
        .await;

    assert!(!artifact.skipped);
    assert!(artifact.lint_ok, "unexpected findings: {:?}", artifact.lint_findings);
    assert!(artifact.ready);
    assert!(artifact.rag_used);
    assert!(!artifact.rag_refs.is_empty() && artifact.rag_refs.len() <= 6);
}
