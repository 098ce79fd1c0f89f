use super::*;
use crate::embedding::MockEmbedder;
use crate::generation::{GateConfig, GenerationGate, MockGenerator, OutputFormat};
use crate::retrieval::{Retriever, RetrieverConfig};
use crate::scoring::{
    CoverageConfidenceScorer, DEFAULT_RED_FLAGS, Validator, ViolationConfig, ViolationEngine,
};
use crate::vectordb::{CandidateMetadata, MockPoint, MockVectorIndex};
use async_trait::async_trait;
use std::sync::Arc;

struct FixedRouter(GatePlan);

#[async_trait]
impl PlanRouter for FixedRouter {
    async fn route(&self, _desc: &str) -> Result<GatePlan, RoutingError> {
        Ok(self.0.clone())
    }
}

struct DownRouter;

#[async_trait]
impl PlanRouter for DownRouter {
    async fn route(&self, _desc: &str) -> Result<GatePlan, RoutingError> {
        Err(RoutingError::Unavailable {
            reason: "model offline".to_string(),
        })
    }
}

fn guide_index() -> Arc<MockVectorIndex> {
    let mut index = MockVectorIndex::new();
    for (i, score) in [0.9, 0.85, 0.8, 0.7, 0.6].iter().enumerate() {
        index = index.with_point(
            "guides",
            MockPoint::new(format!("g{i}"), format!("guidance {i}"))
                .with_score(*score)
                .with_metadata(
                    CandidateMetadata::default()
                        .with_doc(format!("GUIDE-{i}"))
                        .with_module("M2.3")
                        .with_page(i as i64),
                ),
        );
    }
    Arc::new(index)
}

fn fsm(
    router: Arc<dyn PlanRouter>,
    index: Arc<MockVectorIndex>,
    generator: Arc<MockGenerator>,
) -> PipelineFsm {
    let retriever = Retriever::new(
        Arc::new(MockEmbedder::new(8)),
        index,
        "guides",
        RetrieverConfig::vector_only(),
    );
    let validator = Validator::new(
        retriever.clone(),
        ViolationEngine::new(ViolationConfig::empty().with_red_flags(DEFAULT_RED_FLAGS)),
        CoverageConfidenceScorer::default(),
    );
    let gate = GenerationGate::new(generator, GateConfig::default()).with_references(retriever);
    PipelineFsm::new(router, validator, gate)
}

fn plan(need_parse: bool, need_validate: bool, need_generate: bool) -> GatePlan {
    GatePlan::builder()
        .section("M2.3")
        .need_parse(need_parse)
        .need_validate(need_validate)
        .need_generate(need_generate)
        .build()
        .expect("should build plan")
}

fn fixed(plan: GatePlan) -> Arc<dyn PlanRouter> {
    Arc::new(FixedRouter(plan))
}

// -- routing ---------------------------------------------------------------

#[test]
fn test_heuristic_generate_request() {
    let plan = HeuristicRouter.plan("Draft the M2.3 QOS in markdown");

    assert_eq!(plan.action, Action::Generate);
    assert_eq!(plan.section, "M2.3");
    assert!(plan.need_generate);
    assert!(!plan.need_validate);
    assert!(!plan.need_parse);
    assert!(plan.need_rag);
    assert_eq!(plan.output_format, OutputFormat::Markdown);
}

#[test]
fn test_heuristic_validate_request() {
    let plan = HeuristicRouter.plan("Please check the M2.6 section");
    assert_eq!(plan.action, Action::Validate);
    assert_eq!(plan.section, "M2.6");
    assert_eq!(plan.output_format, OutputFormat::Yaml);
}

#[test]
fn test_heuristic_korean_request_is_full_pipeline() {
    let plan = HeuristicRouter.plan("업로드한 파일로 임상 요약 작성");
    assert_eq!(plan.action, Action::Pipeline);
    assert!(plan.need_parse);
    assert!(plan.need_generate);
    assert_eq!(plan.section, "M2.7");
}

#[test]
fn test_heuristic_unknown_request() {
    let plan = HeuristicRouter.plan("hello there");
    assert_eq!(plan.action, Action::Pipeline);
    assert_eq!(plan.section, "UNKNOWN");
    assert_eq!(plan.effective_section(), "M2.3");
}

#[test]
fn test_route_with_fallback() {
    let routed = plan(false, true, false);
    assert_eq!(route_with_fallback(Ok(routed.clone()), "draft"), routed);

    let fallback = route_with_fallback(
        Err(RoutingError::Unavailable {
            reason: "down".to_string(),
        }),
        "draft m2.3",
    );
    assert_eq!(fallback.action, Action::Generate);
}

#[test]
fn test_plan_builder_validates() {
    let plan = GatePlan::builder().build().expect("should build defaults");
    assert_eq!(plan.action, Action::Pipeline);
    assert_eq!(plan.section, "UNKNOWN");
    assert!(plan.need_rag);

    let plan = GatePlan::builder()
        .section("2.3")
        .need_validate(true)
        .build()
        .expect("should build");
    assert_eq!(plan.section, "M2.3");
    assert_eq!(plan.action, Action::Validate);

    let unknown = GatePlan::builder().section("M9").build().expect("should build");
    assert_eq!(unknown.section, "UNKNOWN");

    let contradictory = GatePlan::builder().action(Action::Generate).build();
    assert!(matches!(contradictory, Err(RoutingError::InvalidPlan { .. })));
}

#[test]
fn test_plan_overrides() {
    let plan = plan(false, true, false).with_overrides(
        &PlanOverrides::default()
            .with_section("2.6")
            .with_output_format(OutputFormat::Markdown),
    );
    assert_eq!(plan.section, "M2.6");
    assert_eq!(plan.output_format, OutputFormat::Markdown);

    let untouched = plan.clone().with_overrides(&PlanOverrides::default().with_section("  "));
    assert_eq!(untouched, plan);
}

#[test]
fn test_action_parse() {
    assert_eq!("Validate".parse::<Action>().expect("valid"), Action::Validate);
    assert!("deploy".parse::<Action>().is_err());
}

// -- state machine ---------------------------------------------------------

#[tokio::test]
async fn test_validate_only_run_skips_generate() {
    let generator = Arc::new(MockGenerator::new("unused"));
    let machine = fsm(fixed(plan(false, true, false)), guide_index(), generator.clone());

    let out = machine.run(&PipelineRequest::new("Drug product description")).await;

    assert!(out.ok);
    assert!(out.error.is_none());
    assert_eq!(
        out.trace.states(),
        vec![PipelineState::Route, PipelineState::Validate, PipelineState::Done]
    );
    assert!(out.trace.entries().iter().all(|e| e.ok));
    assert!(out.validate_result.as_ref().is_some_and(|v| v.passed));
    assert!(out.generate_result.is_none());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_full_run_uses_parsed_markdown() {
    let generator = Arc::new(MockGenerator::new("Drafted [CIT-1]"));
    let parser = Arc::new(MockDocumentParser::new().with_document(
        "qos.pdf",
        "Parsed QOS body",
        3,
    ));
    let machine = fsm(fixed(plan(true, true, true)), guide_index(), generator.clone())
        .with_parser(parser.clone());

    let request = PipelineRequest::new("draft from upload")
        .with_files(["qos.pdf"])
        .with_output_format(OutputFormat::Markdown);
    let out = machine.run(&request).await;

    assert!(out.ok);
    assert_eq!(
        out.trace.states(),
        vec![
            PipelineState::Route,
            PipelineState::Parse,
            PipelineState::Validate,
            PipelineState::Generate,
            PipelineState::Done,
        ]
    );
    assert_eq!(out.trace.entries()[1].extra["pages"], 3);
    assert_eq!(parser.calls(), 1);

    let validation = out.validate_result.as_ref().expect("should validate");
    assert_eq!(validation.normalized_content, "Parsed QOS body");

    let artifact = out.generate_result.as_ref().expect("should generate");
    assert!(!artifact.skipped);
    assert_eq!(artifact.format, OutputFormat::Markdown);
    assert_eq!(generator.calls(), 1);
    assert_eq!(
        generator.last_request().map(|r| r.content),
        Some("Parsed QOS body".to_string())
    );
}

#[tokio::test]
async fn test_failed_validation_short_circuits_generation() {
    let index = guide_index();
    index.set_failing(true);
    let generator = Arc::new(MockGenerator::new("unused"));
    let machine = fsm(fixed(plan(false, true, true)), index, generator.clone());

    let out = machine.run(&PipelineRequest::new("Composition TBD")).await;

    assert!(out.ok, "degraded retrieval is not a pipeline error");
    assert_eq!(generator.calls(), 0);
    let artifact = out.generate_result.expect("should report skipped artifact");
    assert!(artifact.skipped);
    assert_eq!(artifact.reason.as_deref(), Some("gate_not_met"));
    assert!(artifact.text.is_empty());
    assert_eq!(out.trace.entries()[2].extra["skipped"], true);
}

#[tokio::test]
async fn test_generation_without_validation_opens_gate() {
    let generator = Arc::new(MockGenerator::new("Drafted [CIT-1]"));
    let machine = fsm(fixed(plan(false, false, true)), guide_index(), generator.clone());

    let out = machine.run(&PipelineRequest::new("write it")).await;

    assert!(out.ok);
    assert!(out.validate_result.is_none());
    assert_eq!(out.trace.entries()[1].extra["skipped"], true);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_missing_parser_ends_in_error_with_trace() {
    let machine = fsm(
        fixed(plan(true, true, false)),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    );

    let out = machine
        .run(&PipelineRequest::new("parse").with_files(["a.pdf"]))
        .await;

    assert!(!out.ok);
    assert_eq!(
        out.trace.states(),
        vec![PipelineState::Route, PipelineState::Parse, PipelineState::Error]
    );
    assert!(out.trace.entries()[0].ok);
    assert!(!out.trace.entries()[1].ok);
    assert!(!out.trace.entries()[2].ok);
    assert!(out.error.as_deref().is_some_and(|e| e.contains("document parser")));
    assert!(out.plan.is_some(), "partial results survive");
    assert!(out.validate_result.is_none());
}

#[tokio::test]
async fn test_panicking_step_is_captured() {
    let machine = fsm(
        fixed(plan(true, true, false)),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    )
    .with_parser(Arc::new(MockDocumentParser::panicking("corrupt xref table")));

    let out = machine
        .run(&PipelineRequest::new("parse").with_files(["a.pdf"]))
        .await;

    assert!(!out.ok);
    assert_eq!(out.trace.last().map(|e| e.state), Some(PipelineState::Error));
    assert!(
        out.error
            .as_deref()
            .is_some_and(|e| e.contains("corrupt xref table"))
    );
}

#[tokio::test]
async fn test_parser_failure_degrades() {
    let machine = fsm(
        fixed(plan(true, true, false)),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    )
    .with_parser(Arc::new(MockDocumentParser::failing("service unavailable")));

    let out = machine
        .run(&PipelineRequest::new("Drug product").with_files(["a.pdf", "b.xlsx"]))
        .await;

    assert!(out.ok);
    let parsed = out.parse_result.expect("should record parse output");
    assert!(parsed.results.is_empty());
    assert_eq!(parsed.errors.len(), 2);
    assert_eq!(
        out.validate_result.map(|v| v.normalized_content),
        Some("Drug product".to_string())
    );
}

#[tokio::test]
async fn test_parse_without_files_records_zero_pages() {
    let machine = fsm(
        fixed(plan(true, true, false)),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    );

    let out = machine.run(&PipelineRequest::new("Drug product")).await;

    assert!(out.ok);
    assert!(out.parse_result.is_none());
    assert_eq!(out.trace.entries()[1].extra["pages"], 0);
}

#[tokio::test]
async fn test_router_failure_falls_back_to_heuristics() {
    let machine = fsm(
        Arc::new(DownRouter),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    );

    let out = machine.run(&PipelineRequest::new("check m2.3")).await;

    assert!(out.ok);
    let plan = out.plan.expect("should resolve plan");
    assert_eq!(plan.action, Action::Validate);
    assert_eq!(out.trace.entries()[0].extra["action"], "validate");
    assert_eq!(out.trace.entries()[0].extra["section"], "M2.3");
}

#[tokio::test]
async fn test_reruns_share_trace_shape() {
    let machine = fsm(
        fixed(plan(false, true, true)),
        guide_index(),
        Arc::new(MockGenerator::new("Drafted [CIT-1]")),
    );
    let request = PipelineRequest::new("Drug product description");

    let first = machine.run(&request).await;
    let second = machine.run(&request).await;

    assert_eq!(first.trace.states(), second.trace.states());
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_output_serializes_trace_entries() {
    let machine = fsm(
        fixed(plan(false, true, false)),
        guide_index(),
        Arc::new(MockGenerator::new("unused")),
    );
    let out = machine.run(&PipelineRequest::new("Drug product")).await;
    let json = serde_json::to_value(&out).expect("should serialize");

    assert_eq!(json["trace"][0]["state"], "ROUTE");
    assert_eq!(json["trace"][0]["section"], "M2.3");
    assert!(json["trace"][0]["timestamp"].is_string());
    assert_eq!(json["trace"][1]["passed"], true);
    assert!(json["runId"].is_string());
    assert!(json["validateResult"].is_object());
    assert!(json["generateResult"].is_null());
}
