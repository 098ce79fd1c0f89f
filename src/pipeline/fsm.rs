use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::parse::{DocumentParser, ParseOutput};
use super::plan::{GatePlan, PlanOverrides};
use super::router::{PlanRouter, route_with_fallback};
use super::trace::{PipelineState, PipelineTrace};
use crate::generation::{GenerationArtifact, GenerationGate, OutputFormat};
use crate::scoring::{ValidationResult, Validator};

/// Inputs of `RunPipeline(desc, files, section, format)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub desc: String,
    pub files: Vec<String>,
    pub overrides: PlanOverrides,
    pub auto_fix: bool,
}

impl PipelineRequest {
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            files: Vec::new(),
            overrides: PlanOverrides::default(),
            auto_fix: true,
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.overrides.section = Some(section.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.overrides.output_format = Some(format);
        self
    }

    pub fn with_auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }
}

/// Audit artifact of one run. Returned whether the run finished in `DONE` or `ERROR`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub plan: Option<GatePlan>,
    pub parse_result: Option<ParseOutput>,
    pub validate_result: Option<ValidationResult>,
    pub generate_result: Option<GenerationArtifact>,
    pub trace: PipelineTrace,
    pub ok: bool,
    pub error: Option<String>,
}

impl PipelineOutput {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            plan: None,
            parse_result: None,
            validate_result: None,
            generate_result: None,
            trace: PipelineTrace::new(),
            ok: false,
            error: None,
        }
    }

    /// Content under review: the first parsed document when parsing produced one.
    fn content<'a>(&'a self, request: &'a PipelineRequest) -> &'a str {
        self.parse_result
            .as_ref()
            .and_then(ParseOutput::first_markdown)
            .unwrap_or(&request.desc)
    }
}

type StepResult = Result<(PipelineState, Map<String, Value>), PipelineError>;

fn extra(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// `ROUTE → (PARSE) → VALIDATE → (GENERATE) → DONE`, or `ERROR` from any step.
///
/// One trace accumulator per [`run`](Self::run) call; the machine itself is shareable.
#[derive(Clone)]
pub struct PipelineFsm {
    router: Arc<dyn PlanRouter>,
    parser: Option<Arc<dyn DocumentParser>>,
    validator: Validator,
    gate: GenerationGate,
}

impl std::fmt::Debug for PipelineFsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineFsm")
            .field("has_parser", &self.parser.is_some())
            .field("validator", &self.validator)
            .field("gate", &self.gate)
            .finish()
    }
}

impl PipelineFsm {
    pub fn new(router: Arc<dyn PlanRouter>, validator: Validator, gate: GenerationGate) -> Self {
        Self {
            router,
            parser: None,
            validator,
            gate,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    #[instrument(skip(self, request), fields(files = request.files.len()))]
    pub async fn run(&self, request: &PipelineRequest) -> PipelineOutput {
        let mut out = PipelineOutput::new(Uuid::new_v4());
        let mut state = PipelineState::Route;

        while !state.is_terminal() {
            let step = AssertUnwindSafe(self.step(state, request, &mut out))
                .catch_unwind()
                .await;
            let result = match step {
                Ok(result) => result,
                Err(payload) => Err(PipelineError::Panicked {
                    state,
                    message: panic_message(payload),
                }),
            };

            state = match result {
                Ok((next, extra)) => {
                    info!(run_id = %out.run_id, from = %state, to = %next, "Pipeline transition");
                    out.trace.push(state, true, extra);
                    next
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(run_id = %out.run_id, state = %state, error = %message, "Pipeline step failed");
                    let mut failure = Map::new();
                    failure.insert("error".to_string(), Value::String(message.clone()));
                    out.trace.push(state, false, failure.clone());
                    out.trace.push(PipelineState::Error, false, failure);
                    out.error = Some(message);
                    PipelineState::Error
                }
            };
        }

        if state == PipelineState::Done {
            out.trace.push(PipelineState::Done, true, Map::new());
            out.ok = true;
        }
        out
    }

    async fn step(
        &self,
        state: PipelineState,
        request: &PipelineRequest,
        out: &mut PipelineOutput,
    ) -> StepResult {
        match state {
            PipelineState::Route => self.route(request, out).await,
            PipelineState::Parse => self.parse(request, out).await,
            PipelineState::Validate => self.validate(request, out).await,
            PipelineState::Generate => self.generate(request, out).await,
            PipelineState::Done | PipelineState::Error => Ok((state, Map::new())),
        }
    }

    async fn route(&self, request: &PipelineRequest, out: &mut PipelineOutput) -> StepResult {
        let routed = self.router.route(&request.desc).await;
        let plan = route_with_fallback(routed, &request.desc).with_overrides(&request.overrides);

        let next = if plan.need_parse {
            PipelineState::Parse
        } else {
            PipelineState::Validate
        };
        let details = extra(json!({"action": plan.action, "section": plan.section}));
        out.plan = Some(plan);
        Ok((next, details))
    }

    async fn parse(&self, request: &PipelineRequest, out: &mut PipelineOutput) -> StepResult {
        if !request.files.is_empty() {
            let parser = self
                .parser
                .as_ref()
                .ok_or(PipelineError::MissingCollaborator {
                    state: PipelineState::Parse,
                    name: "document parser",
                })?;
            let output = match parser.parse(&request.files).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(error = %e, "Parsing failed, continuing without documents");
                    ParseOutput::failed(&request.files, &e)
                }
            };
            out.parse_result = Some(output);
        }

        let pages = out.parse_result.as_ref().map_or(0, ParseOutput::total_pages);
        Ok((PipelineState::Validate, extra(json!({"pages": pages}))))
    }

    async fn validate(&self, request: &PipelineRequest, out: &mut PipelineOutput) -> StepResult {
        let plan = out.plan.clone().ok_or(PipelineError::MissingPlan {
            state: PipelineState::Validate,
        })?;

        let details = if plan.need_validate {
            let result = self
                .validator
                .validate(plan.effective_section(), out.content(request), request.auto_fix)
                .await;
            let details = extra(json!({"passed": result.passed, "score": result.score}));
            out.validate_result = Some(result);
            details
        } else {
            extra(json!({"skipped": true}))
        };

        let next = if plan.need_generate {
            PipelineState::Generate
        } else {
            PipelineState::Done
        };
        Ok((next, details))
    }

    async fn generate(&self, request: &PipelineRequest, out: &mut PipelineOutput) -> StepResult {
        let plan = out.plan.clone().ok_or(PipelineError::MissingPlan {
            state: PipelineState::Generate,
        })?;

        let artifact = self
            .gate
            .run(
                plan.effective_section(),
                out.content(request),
                plan.output_format,
                out.validate_result.as_ref(),
                &request.files,
            )
            .await;
        let details = extra(json!({"skipped": artifact.skipped, "ready": artifact.ready}));
        out.generate_result = Some(artifact);
        Ok((PipelineState::Done, details))
    }
}
