use super::*;
use crate::embedding::MockEmbedder;
use crate::retrieval::{Retriever, RetrieverConfig};
use crate::scoring::{ScoringThresholds, ValidationResult};
use crate::vectordb::{CandidateMetadata, MockPoint, MockVectorIndex};
use std::sync::Arc;

const DRAFT_YAML: &str = r#"```yaml
ProductName: Sentinel Tablet 10 mg
DosageForm: film-coated tablet
DrugSubstance: Sentinelib hydrochloride [CIT-1]
DrugProduct: Immediate-release film-coated tablet [CIT-2]
References:
  - {doc: ICH Q6A, section: "3.2", page: 1, para_id: p1}
```"#;

fn validation(passed: bool, score: f32) -> ValidationResult {
    ValidationResult {
        passed,
        coverage: score,
        confidence: score,
        glossary_hit: 0.0,
        violation_weight: 0,
        score_raw: score,
        score,
        violations: Vec::new(),
        citations: Vec::new(),
        thresholds: ScoringThresholds::default(),
        normalized_content: "normalized drug product description".to_string(),
    }
}

fn reference_point(id: &str, doc: &str, page: i64, module: &str, score: f32) -> MockPoint {
    MockPoint::new(id, format!("guidance text {id}"))
        .with_score(score)
        .with_metadata(
            CandidateMetadata::default()
                .with_doc(doc)
                .with_page(page)
                .with_module(module),
        )
}

fn reference_retriever() -> Retriever {
    let index = MockVectorIndex::new()
        .with_point("guides", reference_point("a", "ICH Q6A", 1, "M2.3", 0.9))
        .with_point("guides", reference_point("b", "ICH Q6A", 1, "M2.3", 0.8))
        .with_point("guides", reference_point("c", "ICH Q3A", 2, "M2.7", 0.7));
    Retriever::new(
        Arc::new(MockEmbedder::new(8)),
        Arc::new(index),
        "guides",
        RetrieverConfig::vector_only(),
    )
}

fn gate(generator: Arc<MockGenerator>) -> GenerationGate {
    GenerationGate::new(generator, GateConfig::default())
}

// -- density ---------------------------------------------------------------

#[test]
fn test_citation_density_short_text() {
    assert_eq!(citation_density("Claim [CIT-1]."), 1.0);
    assert_eq!(citation_density("No markers here."), 0.0);
    assert_eq!(citation_density(""), 0.0);
}

#[test]
fn test_citation_density_scales_with_length() {
    let mut text = "x".repeat(1593);
    text.push_str("[CIT-1]");
    assert_eq!(text.chars().count(), 1600);
    assert_eq!(citation_density(&text), 0.5);
}

#[test]
fn test_count_citation_markers_ignores_malformed() {
    assert_eq!(count_citation_markers("[CIT-1] [CIT-22] [CIT-] [cit-3] CIT-4"), 2);
}

// -- types -----------------------------------------------------------------

#[test]
fn test_output_format_parse() {
    assert_eq!("YAML".parse::<OutputFormat>().expect("valid"), OutputFormat::Yaml);
    assert_eq!("md".parse::<OutputFormat>().expect("valid"), OutputFormat::Markdown);
    assert!(matches!(
        "pdf".parse::<OutputFormat>(),
        Err(GenerationError::InvalidFormat { .. })
    ));
    assert_eq!(OutputFormat::default(), OutputFormat::Yaml);
}

#[test]
fn test_render_context_numbers_references() {
    let request = GenerationRequest {
        section: "M2.3".to_string(),
        content: "c".to_string(),
        output_format: OutputFormat::Yaml,
        references: Vec::new(),
    };
    assert_eq!(render_context(&request), "N/A");
    assert_eq!(build_messages(&request).len(), 3);
}

// -- gate decision ---------------------------------------------------------

#[test]
fn test_ok_for_generation() {
    assert!(ok_for_generation(None, 0.65));
    assert!(ok_for_generation(Some(&validation(true, 0.65)), 0.65));
    assert!(!ok_for_generation(Some(&validation(true, 0.64)), 0.65));
    assert!(!ok_for_generation(Some(&validation(false, 0.95)), 0.65));
}

#[tokio::test]
async fn test_closed_gate_skips_generator() {
    let generator = Arc::new(MockGenerator::new(DRAFT_YAML));
    let gate = gate(generator.clone()).with_references(reference_retriever());

    let artifact = gate
        .run("2.3", "content", OutputFormat::Yaml, Some(&validation(false, 0.3)), &[])
        .await;

    assert_eq!(generator.calls(), 0);
    assert!(artifact.skipped);
    assert_eq!(artifact.reason.as_deref(), Some(GATE_NOT_MET));
    assert!(artifact.text.is_empty());
    assert!(artifact.rag_refs.is_empty());
    assert!(!artifact.rag_used);
    assert!(!artifact.ready);
    assert_eq!(artifact.section, "M2.3");
    assert_eq!(artifact.gen_metrics.gen_score, 0.0);
}

// -- drafting --------------------------------------------------------------

#[tokio::test]
async fn test_yaml_draft_is_linted_and_ready() {
    let generator = Arc::new(MockGenerator::new(DRAFT_YAML));
    let gate = gate(generator.clone()).with_references(reference_retriever());

    let artifact = gate
        .run("M2.3", "raw", OutputFormat::Yaml, Some(&validation(true, 0.8)), &[])
        .await;

    assert_eq!(generator.calls(), 1);
    assert!(!artifact.skipped);
    assert!(artifact.lint_ok, "unexpected findings: {:?}", artifact.lint_findings);
    assert_eq!(artifact.gen_metrics.cit_density, 1.0);
    assert_eq!(artifact.gen_metrics.lint_major, 0);
    assert_eq!(artifact.gen_metrics.gen_score, 1.0);
    assert!(artifact.ready);
    assert!(artifact.offline_fallback.is_none());
    assert!(artifact.rag_used);

    let request = generator.last_request().expect("should record request");
    assert_eq!(request.content, "normalized drug product description");
    assert_eq!(request.references, artifact.rag_refs);
}

#[tokio::test]
async fn test_references_are_unique_per_doc_and_page() {
    let generator = Arc::new(MockGenerator::new("Claim [CIT-1]"));
    let gate = gate(generator).with_references(reference_retriever());

    let artifact = gate.run("M2.3", "query", OutputFormat::Markdown, None, &[]).await;

    let keys: Vec<(&str, Option<i64>)> = artifact
        .rag_refs
        .iter()
        .map(|c| (c.doc.as_str(), c.page))
        .collect();
    assert_eq!(keys, vec![("ICH Q6A", Some(1)), ("ICH Q3A", Some(2))]);
}

#[tokio::test]
async fn test_max_refs_caps_references() {
    let generator = Arc::new(MockGenerator::new("Claim [CIT-1]"));
    let gate = GenerationGate::new(generator, GateConfig::default().with_max_refs(1))
        .with_references(reference_retriever());

    let artifact = gate.run("M2.3", "query", OutputFormat::Markdown, None, &[]).await;
    assert_eq!(artifact.rag_refs.len(), 1);
}

#[tokio::test]
async fn test_markdown_draft_skips_lint() {
    let generator = Arc::new(MockGenerator::new("### M2.3\n\nThe tablet is stable [CIT-1]."));
    let artifact = gate(generator)
        .run("M2.3", "content", OutputFormat::Markdown, None, &[])
        .await;

    assert!(artifact.lint_ok);
    assert!(artifact.lint_findings.is_empty());
    assert_eq!(artifact.gen_metrics.gen_score, 1.0);
    assert!(artifact.ready);
    assert!(!artifact.rag_used, "no reference retriever configured");
}

#[tokio::test]
async fn test_generator_failure_yields_yaml_skeleton() {
    let generator = Arc::new(MockGenerator::failing("connection refused"));
    let artifact = gate(generator)
        .run("M2.3", "content", OutputFormat::Yaml, None, &[])
        .await;

    assert_eq!(artifact.text, offline_skeleton("M2.3", OutputFormat::Yaml));
    assert!(
        artifact
            .offline_fallback
            .as_deref()
            .is_some_and(|e| e.contains("connection refused"))
    );
    assert!(!artifact.lint_ok);
    assert_eq!(artifact.gen_metrics.cit_density, 0.0);
    assert_eq!(artifact.gen_metrics.gen_score, 0.0);
    assert!(!artifact.ready);
    assert!(!artifact.skipped);
}

#[tokio::test]
async fn test_generator_failure_yields_markdown_skeleton() {
    let generator = Arc::new(MockGenerator::failing("timeout"));
    let artifact = gate(generator)
        .run("2.6", "content", OutputFormat::Markdown, None, &[])
        .await;

    assert!(artifact.text.starts_with("### M2.6 Draft"));
    assert!(artifact.lint_ok);
    assert!((artifact.gen_metrics.gen_score - 0.4).abs() < 1e-6);
    assert!(!artifact.ready);
}

#[tokio::test]
async fn test_major_lint_findings_block_readiness() {
    let draft = DRAFT_YAML.replace("film-coated tablet\nDrugSubstance", "lozenge\nDrugSubstance");
    let generator = Arc::new(MockGenerator::new(draft));
    let artifact = gate(generator)
        .run("M2.3", "content", OutputFormat::Yaml, None, &[])
        .await;

    assert_eq!(artifact.gen_metrics.lint_major, 1);
    assert!((artifact.gen_metrics.gen_score - 0.6).abs() < 1e-6);
    assert!(!artifact.ready);

    let lenient = GateConfig::default()
        .with_lint_max_major(1)
        .with_generate_ready_min(0.5);
    let artifact = GenerationGate::new(Arc::new(MockGenerator::new(DRAFT_YAML.replace(
        "film-coated tablet\nDrugSubstance",
        "lozenge\nDrugSubstance",
    ))), lenient)
    .run("M2.3", "content", OutputFormat::Yaml, None, &[])
    .await;
    assert!(artifact.ready, "within tolerated majors and above ready minimum");
}

#[test]
fn test_artifact_serializes_camel_case() {
    let artifact = GenerationArtifact::skipped("M2.3", OutputFormat::Markdown, GateConfig::default());
    let json = serde_json::to_value(&artifact).expect("should serialize");

    assert_eq!(json["format"], "markdown");
    assert_eq!(json["ragUsed"], false);
    assert_eq!(json["reason"], "gate_not_met");
    assert!(json["genMetrics"]["thresholds"]["generateGate"].is_number());
    assert!(json["createdAt"].is_string());
}
