//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SENTINEL_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CONFIDENCE_MIN, DEFAULT_COVERAGE_MIN, DEFAULT_EMBEDDING_DIM, DEFAULT_GENERATE_GATE,
    DEFAULT_GENERATE_READY_MIN, DEFAULT_HYBRID_ALPHA, DEFAULT_LINT_MAX_MAJOR, DEFAULT_MMR_LAMBDA,
    DEFAULT_VIOLATION_MAX,
};

/// Default Qdrant URL used when `SENTINEL_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
/// Default collection holding section guidance.
pub const DEFAULT_GUIDE_COLLECTION: &str = "guidelines";
/// Default collection holding tiered regulations and terminology.
pub const DEFAULT_REFERENCE_COLLECTION: &str = "combined_regulations";
/// Default collection holding the glossary.
pub const DEFAULT_GLOSSARY_COLLECTION: &str = "glossary";
/// Default embedding model name.
pub const DEFAULT_EMBED_MODEL: &str = "intfloat/multilingual-e5-large-instruct";
/// Default generation model name.
pub const DEFAULT_GENERATION_MODEL: &str = "solar-pro2";

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SENTINEL_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Section guidance collection. Default: `guidelines`.
    pub guide_collection: String,

    /// Tiered regulation + terminology collection. Default: `combined_regulations`.
    pub reference_collection: String,

    /// Glossary collection. Default: `glossary`.
    pub glossary_collection: String,

    /// OpenAI-compatible embeddings endpoint. `None` runs the stub embedder.
    pub embed_url: Option<String>,

    /// Embedding model name.
    pub embed_model: String,

    /// Embedding dimension. Default: `1024`.
    pub embed_dim: usize,

    /// Max entries in the embedding cache. Default: `10_000`.
    pub embed_cache_capacity: u64,

    /// Generation model name passed to the chat client.
    pub generation_model: String,

    /// Optional lint checklist file (YAML or JSON).
    pub rules_path: Option<PathBuf>,

    /// Optional terminology normalization rules (YAML or JSON) used by auto-fix.
    pub normalization_path: Option<PathBuf>,

    /// Minimum coverage to pass validation. Default: `0.70`.
    pub coverage_min: f32,

    /// Minimum confidence to pass validation. Default: `0.40`.
    pub confidence_min: f32,

    /// Maximum violation weight to pass validation. Default: `3`.
    pub violation_max: u32,

    /// Validation score required before generation runs. Default: `0.65`.
    pub generate_gate: f32,

    /// Major-or-worse lint findings tolerated in a ready artifact. Default: `0`.
    pub lint_max_major: usize,

    /// Generation score required for a ready artifact. Default: `0.70`.
    pub generate_ready_min: f32,

    /// Vector weight in hybrid fusion. Default: `0.7`.
    pub hybrid_alpha: f32,

    /// MMR relevance/diversity trade-off. Default: `0.5`.
    pub mmr_lambda: f32,

    /// Blend BM25 into guideline retrieval. Default: `false`, since min-max fused scores
    /// do not fit the similarity-calibrated tier bands and thresholds.
    pub lexical_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            guide_collection: DEFAULT_GUIDE_COLLECTION.to_string(),
            reference_collection: DEFAULT_REFERENCE_COLLECTION.to_string(),
            glossary_collection: DEFAULT_GLOSSARY_COLLECTION.to_string(),
            embed_url: None,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dim: DEFAULT_EMBEDDING_DIM,
            embed_cache_capacity: 10_000,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            rules_path: None,
            normalization_path: None,
            coverage_min: DEFAULT_COVERAGE_MIN,
            confidence_min: DEFAULT_CONFIDENCE_MIN,
            violation_max: DEFAULT_VIOLATION_MAX,
            generate_gate: DEFAULT_GENERATE_GATE,
            lint_max_major: DEFAULT_LINT_MAX_MAJOR,
            generate_ready_min: DEFAULT_GENERATE_READY_MIN,
            hybrid_alpha: DEFAULT_HYBRID_ALPHA,
            mmr_lambda: DEFAULT_MMR_LAMBDA,
            lexical_enabled: false,
        }
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "SENTINEL_QDRANT_URL";
    const ENV_GUIDE_COLLECTION: &'static str = "SENTINEL_GUIDE_COLLECTION";
    const ENV_REFERENCE_COLLECTION: &'static str = "SENTINEL_REFERENCE_COLLECTION";
    const ENV_GLOSSARY_COLLECTION: &'static str = "SENTINEL_GLOSSARY_COLLECTION";
    const ENV_EMBED_URL: &'static str = "SENTINEL_EMBED_URL";
    const ENV_EMBED_MODEL: &'static str = "SENTINEL_EMBED_MODEL";
    const ENV_EMBED_DIM: &'static str = "SENTINEL_EMBED_DIM";
    const ENV_EMBED_CACHE_CAPACITY: &'static str = "SENTINEL_EMBED_CACHE_CAPACITY";
    const ENV_GENERATION_MODEL: &'static str = "SENTINEL_GENERATION_MODEL";
    const ENV_RULES_PATH: &'static str = "SENTINEL_RULES_PATH";
    const ENV_NORMALIZATION_PATH: &'static str = "SENTINEL_NORMALIZATION_PATH";
    const ENV_COVERAGE_MIN: &'static str = "SENTINEL_COVERAGE_MIN";
    const ENV_CONFIDENCE_MIN: &'static str = "SENTINEL_CONFIDENCE_MIN";
    const ENV_VIOLATION_MAX: &'static str = "SENTINEL_VIOLATION_MAX";
    const ENV_GENERATE_GATE: &'static str = "SENTINEL_GENERATE_GATE";
    const ENV_LINT_MAX_MAJOR: &'static str = "SENTINEL_LINT_MAX_MAJOR";
    const ENV_GENERATE_READY_MIN: &'static str = "SENTINEL_GENERATE_READY_MIN";
    const ENV_HYBRID_ALPHA: &'static str = "SENTINEL_HYBRID_ALPHA";
    const ENV_MMR_LAMBDA: &'static str = "SENTINEL_MMR_LAMBDA";
    const ENV_LEXICAL: &'static str = "SENTINEL_LEXICAL";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Malformed numbers are errors rather than silently replaced by defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            qdrant_url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url),
            guide_collection: Self::parse_string_from_env(
                Self::ENV_GUIDE_COLLECTION,
                defaults.guide_collection,
            ),
            reference_collection: Self::parse_string_from_env(
                Self::ENV_REFERENCE_COLLECTION,
                defaults.reference_collection,
            ),
            glossary_collection: Self::parse_string_from_env(
                Self::ENV_GLOSSARY_COLLECTION,
                defaults.glossary_collection,
            ),
            embed_url: Self::parse_optional_string_from_env(Self::ENV_EMBED_URL),
            embed_model: Self::parse_string_from_env(Self::ENV_EMBED_MODEL, defaults.embed_model),
            embed_dim: Self::parse_number_from_env(Self::ENV_EMBED_DIM, defaults.embed_dim)?,
            embed_cache_capacity: Self::parse_number_from_env(
                Self::ENV_EMBED_CACHE_CAPACITY,
                defaults.embed_cache_capacity,
            )?,
            generation_model: Self::parse_string_from_env(
                Self::ENV_GENERATION_MODEL,
                defaults.generation_model,
            ),
            rules_path: Self::parse_optional_string_from_env(Self::ENV_RULES_PATH)
                .map(PathBuf::from),
            normalization_path: Self::parse_optional_string_from_env(
                Self::ENV_NORMALIZATION_PATH,
            )
            .map(PathBuf::from),
            coverage_min: Self::parse_number_from_env(
                Self::ENV_COVERAGE_MIN,
                defaults.coverage_min,
            )?,
            confidence_min: Self::parse_number_from_env(
                Self::ENV_CONFIDENCE_MIN,
                defaults.confidence_min,
            )?,
            violation_max: Self::parse_number_from_env(
                Self::ENV_VIOLATION_MAX,
                defaults.violation_max,
            )?,
            generate_gate: Self::parse_number_from_env(
                Self::ENV_GENERATE_GATE,
                defaults.generate_gate,
            )?,
            lint_max_major: Self::parse_number_from_env(
                Self::ENV_LINT_MAX_MAJOR,
                defaults.lint_max_major,
            )?,
            generate_ready_min: Self::parse_number_from_env(
                Self::ENV_GENERATE_READY_MIN,
                defaults.generate_ready_min,
            )?,
            hybrid_alpha: Self::parse_number_from_env(
                Self::ENV_HYBRID_ALPHA,
                defaults.hybrid_alpha,
            )?,
            mmr_lambda: Self::parse_number_from_env(Self::ENV_MMR_LAMBDA, defaults.mmr_lambda)?,
            lexical_enabled: Self::parse_bool_from_env(
                Self::ENV_LEXICAL,
                defaults.lexical_enabled,
            )?,
        })
    }

    /// Validates ranges and paths (does not touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("coverage_min", self.coverage_min),
            ("confidence_min", self.confidence_min),
            ("generate_gate", self.generate_gate),
            ("generate_ready_min", self.generate_ready_min),
            ("hybrid_alpha", self.hybrid_alpha),
            ("mmr_lambda", self.mmr_lambda),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }

        if self.embed_dim == 0 {
            return Err(ConfigError::ZeroValue { name: "embed_dim" });
        }

        let collections = [
            ("guide_collection", &self.guide_collection),
            ("reference_collection", &self.reference_collection),
            ("glossary_collection", &self.glossary_collection),
        ];
        for (name, value) in collections {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyCollection { name });
            }
        }

        for path in [&self.rules_path, &self.normalization_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool {
                    name: var_name,
                    value,
                }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_number_from_env<T: std::str::FromStr>(
        var_name: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                }),
            Err(_) => Ok(default),
        }
    }
}
