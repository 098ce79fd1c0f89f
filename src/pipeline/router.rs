use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::error::RoutingError;
use super::plan::{Action, GatePlan};
use crate::generation::OutputFormat;
use crate::section::UNKNOWN_SECTION;

/// Turns a free-text request into a [`GatePlan`].
#[async_trait]
pub trait PlanRouter: Send + Sync {
    async fn route(&self, desc: &str) -> Result<GatePlan, RoutingError>;
}

const PARSE_KEYWORDS: [&str; 8] = ["pdf", "xlsx", "file", "upload", "ocr", "파일", "스캔", "업로드"];
const GENERATE_KEYWORDS: [&str; 7] = ["draft", "write", "generate", "summar", "작성", "생성", "요약"];
const VALIDATE_KEYWORDS: [&str; 6] = ["validate", "check", "lint", "검증", "체크", "적합성"];

static SECTION_HINTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bm2\.3\b|\bqos\b", "M2.3"),
        (r"\bm2\.4\b|비임상\s*개요|nonclinical\s+overview", "M2.4"),
        (r"\bm2\.5\b|임상\s*개요|clinical\s+overview", "M2.5"),
        (r"\bm2\.6\b|비임상\s*요약|nonclinical\s+summar", "M2.6"),
        (r"\bm2\.7\b|임상\s*요약|clinical\s+summar", "M2.7"),
        (r"\bm1\b|행정|라벨", "M1"),
    ]
    .into_iter()
    .map(|(pattern, section)| (Regex::new(pattern).expect("static pattern is valid"), section))
    .collect()
});

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Keyword-based router. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRouter;

impl HeuristicRouter {
    pub fn plan(&self, desc: &str) -> GatePlan {
        let d = desc.to_lowercase();

        let need_parse = mentions_any(&d, &PARSE_KEYWORDS);
        let need_generate = mentions_any(&d, &GENERATE_KEYWORDS);
        let need_validate = mentions_any(&d, &VALIDATE_KEYWORDS);

        let section = SECTION_HINTS
            .iter()
            .find(|(regex, _)| regex.is_match(&d))
            .map_or(UNKNOWN_SECTION, |(_, section)| *section);

        let output_format = if d.contains("yaml") {
            OutputFormat::Yaml
        } else if d.contains("markdown") {
            OutputFormat::Markdown
        } else {
            OutputFormat::Yaml
        };

        let plan = GatePlan {
            action: Action::derive(need_parse, need_validate, need_generate),
            section: section.to_string(),
            need_parse,
            need_rag: true,
            need_generate,
            need_validate,
            output_format,
        };
        debug!(action = %plan.action, section = %plan.section, "Heuristic plan");
        plan
    }
}

#[async_trait]
impl PlanRouter for HeuristicRouter {
    async fn route(&self, desc: &str) -> Result<GatePlan, RoutingError> {
        Ok(self.plan(desc))
    }
}

/// Keeps a successful routed plan, otherwise falls back to [`HeuristicRouter`].
pub fn route_with_fallback(primary: Result<GatePlan, RoutingError>, desc: &str) -> GatePlan {
    match primary {
        Ok(plan) => plan,
        Err(e) => {
            warn!(error = %e, "Routing failed, using heuristic plan");
            HeuristicRouter.plan(desc)
        }
    }
}
