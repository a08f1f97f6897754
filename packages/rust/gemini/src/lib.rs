//! Text generation client for CopyCraft.
//!
//! The wizard only needs one operation from the outside world: send a prompt,
//! optionally with web-search grounding, and get text plus citation metadata
//! back. [`GenerationClient`] is that seam; [`GeminiClient`] implements it
//! against the Gemini `generateContent` REST endpoint.

mod client;
mod wire;

use async_trait::async_trait;

use copycraft_shared::{GroundingMetadata, Result};

pub use client::GeminiClient;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A single one-shot generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Must not be empty.
    pub prompt: String,
    /// Optional system instruction sent alongside the prompt.
    pub system_instruction: Option<String>,
    /// Enable the service's web-search grounding tool.
    pub search_grounding: bool,
}

impl GenerationRequest {
    /// An ungrounded request with no system instruction.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            search_grounding: false,
        }
    }

    /// Turn on web-search grounding.
    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Token accounting reported by the service, zero when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub tokens_in: u64,
    pub tokens_out: u64,
}

/// Result of a generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    /// Generated text. Empty, never missing, when the service returned no content.
    pub text: String,
    /// Raw citation metadata, present only for grounded responses.
    pub grounding_metadata: Option<GroundingMetadata>,
    pub usage: TokenUsage,
}

impl Generation {
    /// A plain text result with no grounding, handy for fakes.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// One-shot text generation.
///
/// Implementations perform exactly one call per invocation: no retry, no
/// partial results. Every failure surfaces as
/// [`CopyCraftError::Generation`](copycraft_shared::CopyCraftError::Generation).
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;

    /// Model or backend name, for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_flags() {
        let req = GenerationRequest::new("hello")
            .with_search_grounding()
            .with_system_instruction("be brief");
        assert_eq!(req.prompt, "hello");
        assert!(req.search_grounding);
        assert_eq!(req.system_instruction.as_deref(), Some("be brief"));
    }

    #[test]
    fn plain_request_is_ungrounded() {
        let req = GenerationRequest::new("hello");
        assert!(!req.search_grounding);
        assert!(req.system_instruction.is_none());
    }

    #[test]
    fn text_generation_has_no_metadata() {
        let generation = Generation::text("body");
        assert_eq!(generation.text, "body");
        assert!(generation.grounding_metadata.is_none());
        assert_eq!(generation.usage, TokenUsage::default());
    }
}
