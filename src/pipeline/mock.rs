use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::ParseError;
use super::parse::{DocumentParser, ParseFailure, ParseOutput, ParsedDocument};

#[derive(Debug, Clone)]
enum Behavior {
    Documents(HashMap<String, (String, u32)>),
    Fail(String),
    Panic(String),
}

/// Scriptable parser for tests.
///
/// Registered files parse to their Markdown; unknown files become error entries.
pub struct MockDocumentParser {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl Default for MockDocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocumentParser {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Documents(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_document(mut self, input: impl Into<String>, markdown: impl Into<String>, pages: u32) -> Self {
        if let Behavior::Documents(docs) = &mut self.behavior {
            docs.insert(input.into(), (markdown.into(), pages));
        }
        self
    }

    /// Every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fail(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call panics with `message`.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Panic(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentParser for MockDocumentParser {
    async fn parse(&self, files: &[String]) -> Result<ParseOutput, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let docs = match &self.behavior {
            Behavior::Documents(docs) => docs,
            Behavior::Fail(reason) => {
                return Err(ParseError::Failed {
                    reason: reason.clone(),
                });
            }
            Behavior::Panic(message) => panic!("{message}"),
        };

        let mut output = ParseOutput::default();
        for input in files {
            match docs.get(input) {
                Some((markdown, pages)) => output.results.push(ParsedDocument {
                    input: input.clone(),
                    markdown: markdown.clone(),
                    pages: *pages,
                }),
                None => output.errors.push(ParseFailure {
                    input: input.clone(),
                    error: "file not found".to_string(),
                }),
            }
        }
        Ok(output)
    }
}
