//! Core domain types for the CopyCraft writing wizard.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AngleId
// ---------------------------------------------------------------------------

/// Opaque identifier for a proposed headline angle.
///
/// Unique within one research call; nothing relies on uniqueness across calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AngleId(pub Uuid);

impl AngleId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AngleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AngleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AngleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Angle / Source
// ---------------------------------------------------------------------------

/// A candidate headline plus the rationale behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Angle {
    pub id: AngleId,
    /// Never empty.
    pub title: String,
    pub description: String,
}

/// A web page cited by a search-grounded generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

// ---------------------------------------------------------------------------
// Grounding metadata (as returned by the generation service)
// ---------------------------------------------------------------------------

/// Raw citation metadata attached to a grounded response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One citation chunk. Only web chunks are understood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebChunk>,
}

/// The web page behind a citation chunk. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GroundingChunk {
    /// Convenience constructor for a web citation.
    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            web: Some(WebChunk {
                uri: Some(uri.into()),
                title: Some(title.into()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// StyleTag
// ---------------------------------------------------------------------------

/// Named voice presets, plus `Custom` which defers tone to reference links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleTag {
    Senior,
    Expert,
    Official,
    Neighbor,
    Storytelling,
    Custom,
}

impl StyleTag {
    /// Every preset, in display order. `Custom` is last.
    pub const ALL: [StyleTag; 6] = [
        Self::Senior,
        Self::Expert,
        Self::Official,
        Self::Neighbor,
        Self::Storytelling,
        Self::Custom,
    ];

    /// The descriptive instruction embedded in the article prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Senior => "学姐/学长分享 (Senior Student)",
            Self::Expert => "行业专家 (Industry Expert)",
            Self::Official => "官方严谨 (Official/Formal)",
            Self::Neighbor => "邻家朋友 (Neighborly/Casual)",
            Self::Storytelling => "故事叙述 (Storytelling)",
            Self::Custom => "自定义/参考链接 (Custom Based on Links)",
        }
    }

    /// Lowercase name accepted by [`FromStr`](std::str::FromStr).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Senior => "senior",
            Self::Expert => "expert",
            Self::Official => "official",
            Self::Neighbor => "neighbor",
            Self::Storytelling => "storytelling",
            Self::Custom => "custom",
        }
    }

    /// Whether this is a real preset rather than the `Custom` sentinel.
    pub fn is_preset(&self) -> bool {
        !matches!(self, Self::Custom)
    }
}

impl std::fmt::Display for StyleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StyleTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown style '{s}': expected one of {}", names.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One step of the linear wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Topic,
    Research,
    Outline,
    Style,
    Result,
}

impl Stage {
    /// 1-based step number shown to the user.
    pub fn step(&self) -> usize {
        match self {
            Self::Topic => 1,
            Self::Research => 2,
            Self::Outline => 3,
            Self::Style => 4,
            Self::Result => 5,
        }
    }

    /// Short user-facing label.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Topic => "主题",
            Self::Research => "标题",
            Self::Outline => "大纲",
            Self::Style => "风格",
            Self::Result => "成文",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Research => "research",
            Self::Outline => "outline",
            Self::Style => "style",
            Self::Result => "result",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DraftState
// ---------------------------------------------------------------------------

/// Everything one wizard run has accumulated so far.
///
/// Fields are filled strictly in stage order. `Default` is the empty state a
/// fresh or restarted wizard starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    pub topic: String,
    pub target_audience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_angle: Option<Angle>,
    pub outline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleTag>,
    pub custom_style_links: String,
    pub final_content: String,
    #[serde(default)]
    pub research_sources: Vec<Source>,
    #[serde(default)]
    pub article_sources: Vec<Source>,
}
