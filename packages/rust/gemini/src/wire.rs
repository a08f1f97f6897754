//! JSON shapes of the `generateContent` endpoint.
//!
//! Only the fields the wizard reads are modelled; everything else in the
//! response is ignored.

use serde::{Deserialize, Serialize};

use copycraft_shared::GroundingMetadata;

use crate::{Generation, GenerationRequest, TokenUsage};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

/// Serializes to `{}`; the tool takes no options.
#[derive(Debug, Serialize)]
struct GoogleSearch {}

impl<'a> From<&'a GenerationRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        let tools = if request.search_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![TextPart {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system_instruction.as_deref().map(|text| Content {
                role: None,
                parts: vec![TextPart { text }],
            }),
            tools,
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    /// Thinking models tag their reasoning parts; those are not output.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    /// Collapse the response to the first candidate's text and grounding.
    pub(crate) fn into_generation(self) -> Generation {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                tokens_in: u.prompt_token_count,
                tokens_out: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Generation {
                usage,
                ..Default::default()
            };
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Generation {
            text,
            grounding_metadata: candidate.grounding_metadata,
            usage,
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use copycraft_shared::GroundingChunk;

    #[test]
    fn grounded_request_serializes_search_tool() {
        let req = GenerationRequest::new("find things")
            .with_search_grounding()
            .with_system_instruction("be useful");
        let json = serde_json::to_value(GenerateContentRequest::from(&req)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "find things"}]}],
                "systemInstruction": {"parts": [{"text": "be useful"}]},
                "tools": [{"googleSearch": {}}],
            })
        );
    }

    #[test]
    fn plain_request_omits_tools_and_instruction() {
        let req = GenerationRequest::new("outline please");
        let json = serde_json::to_string(&GenerateContentRequest::from(&req)).unwrap();
        assert!(!json.contains("tools"));
        assert!(!json.contains("systemInstruction"));
        assert!(json.contains("outline please"));
    }

    #[test]
    fn response_joins_text_parts_and_skips_thoughts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Hello, "},
                    {"text": "world"}
                ]},
                "groundingMetadata": {
                    "groundingChunks": [{"web": {"uri": "https://a.example", "title": "A"}}]
                }
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let generation = parsed.into_generation();
        assert_eq!(generation.text, "Hello, world");
        assert_eq!(generation.usage.tokens_in, 12);
        assert_eq!(generation.usage.tokens_out, 34);
        let metadata = generation.grounding_metadata.expect("metadata");
        assert_eq!(metadata.grounding_chunks, vec![GroundingChunk::web("https://a.example", "A")]);
    }

    #[test]
    fn empty_response_yields_empty_text() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        let generation = parsed.into_generation();
        assert_eq!(generation.text, "");
        assert!(generation.grounding_metadata.is_none());
    }

    #[test]
    fn candidate_without_content_yields_empty_text() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_generation().text, "");
    }
}
