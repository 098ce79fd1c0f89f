use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::RoutingError;
use crate::generation::OutputFormat;
use crate::section::{DEFAULT_SECTION, UNKNOWN_SECTION, canonical_section, normalize_section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Generate,
    Validate,
    Parse,
    Pipeline,
}

impl Action {
    /// Single-purpose action when exactly one intent applies, `Pipeline` otherwise.
    pub fn derive(need_parse: bool, need_validate: bool, need_generate: bool) -> Self {
        if need_generate && !need_validate && !need_parse {
            Action::Generate
        } else if need_validate && !need_generate {
            Action::Validate
        } else if need_parse && !need_generate && !need_validate {
            Action::Parse
        } else {
            Action::Pipeline
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Generate => "generate",
            Action::Validate => "validate",
            Action::Parse => "parse",
            Action::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" => Ok(Action::Generate),
            "validate" => Ok(Action::Validate),
            "parse" => Ok(Action::Parse),
            "pipeline" => Ok(Action::Pipeline),
            other => Err(RoutingError::InvalidPlan {
                reason: format!("unknown action '{other}'"),
            }),
        }
    }
}

/// Resolved routing decision for one run. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePlan {
    pub action: Action,
    /// Canonical section code or `UNKNOWN`.
    pub section: String,
    pub need_parse: bool,
    pub need_rag: bool,
    pub need_generate: bool,
    pub need_validate: bool,
    pub output_format: OutputFormat,
}

impl GatePlan {
    pub fn builder() -> GatePlanBuilder {
        GatePlanBuilder::default()
    }

    /// Section to validate and draft against; `UNKNOWN` falls back to the default section.
    pub fn effective_section(&self) -> &str {
        if self.section == UNKNOWN_SECTION {
            DEFAULT_SECTION
        } else {
            &self.section
        }
    }

    /// Applies caller-supplied overrides on top of the routed plan.
    pub fn with_overrides(mut self, overrides: &PlanOverrides) -> Self {
        if let Some(section) = overrides.section.as_deref().filter(|s| !s.trim().is_empty()) {
            self.section = normalize_section(section);
        }
        if let Some(format) = overrides.output_format {
            self.output_format = format;
        }
        self
    }
}

/// Builder for [`GatePlan`]; `build` fills defaults and rejects contradictory plans.
#[derive(Debug, Clone)]
pub struct GatePlanBuilder {
    action: Option<Action>,
    section: Option<String>,
    need_parse: bool,
    need_rag: bool,
    need_generate: bool,
    need_validate: bool,
    output_format: OutputFormat,
}

impl Default for GatePlanBuilder {
    fn default() -> Self {
        Self {
            action: None,
            section: None,
            need_parse: false,
            need_rag: true,
            need_generate: false,
            need_validate: false,
            output_format: OutputFormat::default(),
        }
    }
}

impl GatePlanBuilder {
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn need_parse(mut self, value: bool) -> Self {
        self.need_parse = value;
        self
    }

    pub fn need_rag(mut self, value: bool) -> Self {
        self.need_rag = value;
        self
    }

    pub fn need_generate(mut self, value: bool) -> Self {
        self.need_generate = value;
        self
    }

    pub fn need_validate(mut self, value: bool) -> Self {
        self.need_validate = value;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn build(self) -> Result<GatePlan, RoutingError> {
        let action = self.action.unwrap_or_else(|| {
            Action::derive(self.need_parse, self.need_validate, self.need_generate)
        });

        let missing = match action {
            Action::Generate if !self.need_generate => Some("need_generate"),
            Action::Validate if !self.need_validate => Some("need_validate"),
            Action::Parse if !self.need_parse => Some("need_parse"),
            _ => None,
        };
        if let Some(flag) = missing {
            return Err(RoutingError::InvalidPlan {
                reason: format!("action '{action}' requires {flag}"),
            });
        }

        let section = match self.section.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => canonical_section(s),
            _ => UNKNOWN_SECTION.to_string(),
        };

        Ok(GatePlan {
            action,
            section,
            need_parse: self.need_parse,
            need_rag: self.need_rag,
            need_generate: self.need_generate,
            need_validate: self.need_validate,
            output_format: self.output_format,
        })
    }
}

/// Caller overrides applied after routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    pub section: Option<String>,
    pub output_format: Option<OutputFormat>,
}

impl PlanOverrides {
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}
