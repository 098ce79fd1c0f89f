use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub input: String,
    pub markdown: String,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub input: String,
    pub error: String,
}

/// Per-file parse results; files that failed are listed under `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub results: Vec<ParsedDocument>,
    pub errors: Vec<ParseFailure>,
}

impl ParseOutput {
    /// Output recording the same failure for every file.
    pub fn failed(files: &[String], error: &ParseError) -> Self {
        Self {
            results: Vec::new(),
            errors: files
                .iter()
                .map(|input| ParseFailure {
                    input: input.clone(),
                    error: error.to_string(),
                })
                .collect(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.results.iter().map(|r| r.pages).sum()
    }

    /// Markdown of the first parsed document, if any.
    pub fn first_markdown(&self) -> Option<&str> {
        self.results.first().map(|r| r.markdown.as_str())
    }
}

/// Converts uploaded files (PDF, spreadsheets) to Markdown.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, files: &[String]) -> Result<ParseOutput, ParseError>;
}
