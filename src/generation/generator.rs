use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::{debug, instrument};

use super::error::GenerationError;
use super::types::{GenerationRequest, OutputFormat};

/// Drafts a document section from content and references.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Renders the numbered reference block the draft cites from.
pub fn render_context(request: &GenerationRequest) -> String {
    if request.references.is_empty() {
        return "N/A".to_string();
    }
    request
        .references
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[CIT-{}] doc={} section={} page={}\nSNIPPET: {}",
                i + 1,
                r.doc,
                r.section.as_deref().unwrap_or("-"),
                r.page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                r.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System, instruction and user messages for one request.
pub fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let section = &request.section;
    let style = match request.output_format {
        OutputFormat::Yaml => "YAML",
        OutputFormat::Markdown => "Markdown",
    };

    let system = format!(
        "Role: drafting agent for CTD section {section} of a regulatory submission.\n\
         Rules:\n\
         - State facts only from the Context below; do not speculate.\n\
         - End each supported sentence with its evidence marker, e.g. [CIT-1], [CIT-2].\n\
         - Answer in {style} only.\n\
         - Use regulatory language.\n\
         - Write NEED_INPUT for any value you cannot ground."
    );

    let instruction = match request.output_format {
        OutputFormat::Yaml => format!(
            "1) Produce YAML following the CTD {section} skeleton.\n\
             2) Mark every key statement with [CIT-i].\n\
             3) Finish with References: a list of {{doc, section, page, para_id}}.\n\
             4) Use \"NEED_INPUT\" for unclear values.\n\
             5) Wrap the document in a ```yaml code fence."
        ),
        OutputFormat::Markdown => format!(
            "1) Write CTD section {section} in Markdown.\n\
             2) Mark every key statement with [CIT-i].\n\
             3) End with a '## References' section listing doc | section | page | para_id.\n\
             4) Use NEED_INPUT for unclear values."
        ),
    };

    let user = format!(
        "Request:\n{}\n\nContext:\n{}",
        request.content.trim(),
        render_context(request)
    );

    vec![
        ChatMessage::system(system),
        ChatMessage::user(instruction),
        ChatMessage::user(user),
    ]
}

/// [`Generator`] backed by a `genai` chat model.
pub struct GenaiGenerator {
    client: Client,
    model: String,
}

impl GenaiGenerator {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl std::fmt::Debug for GenaiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiGenerator")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Generator for GenaiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, section = %request.section))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let chat_req = ChatRequest::new(build_messages(request));
        let resp = self.client.exec_chat(&self.model, chat_req, None).await?;
        let text = resp.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!(chars = text.len(), "Generation response received");
        Ok(text)
    }
}

/// Stand-in used when no model is configured; every call fails so the gate emits the
/// offline skeleton.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl Generator for OfflineGenerator {
    fn model_name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::RequestFailed {
            reason: "no generation model configured".to_string(),
        })
    }
}
