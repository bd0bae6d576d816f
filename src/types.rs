//! Core types for Scribe
//!
//! The generation request as it travels from the form to the relay, plus the
//! wire bodies and error taxonomy shared by both sides of the relay endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model used when the form has not picked one
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";

/// A selectable model in the catalog
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    /// Free-tier models are heavily rate limited upstream
    pub free: bool,
}

/// Models offered by the writing form. The relay accepts any model id.
pub const KNOWN_MODELS: &[ModelInfo] = &[
    ModelInfo { id: DEFAULT_MODEL, free: true },
    ModelInfo { id: "anthropic/claude-3-haiku:beta", free: false },
    ModelInfo { id: "google/gemini-2.5-flash:free", free: true },
    ModelInfo { id: "google/gemini-2.0-flash-exp:free", free: true },
    ModelInfo { id: "moonshotai/kimi-k2:free", free: true },
    ModelInfo { id: "deepseek/deepseek-r1-0528:free", free: true },
];

/// Target language of the generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "String")]
pub enum Language {
    #[default]
    Zh,
    En,
    Ja,
}

impl Language {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
            Self::Ja => "ja",
        }
    }

    /// Name used inside the composed instruction
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Self::Zh => "Chinese",
            Self::En => "English",
            Self::Ja => "Japanese",
        }
    }

    /// Parse a code or form label. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "zh" | "中文" => Some(Self::Zh),
            "en" | "英文" => Some(Self::En),
            "ja" | "日文" => Some(Self::Ja),
            _ => None,
        }
    }

    /// Parse leniently: unrecognized values become the default (Chinese)
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl From<Option<Value>> for Language {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::parse_or_default(&s),
            _ => Self::default(),
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.code().to_string()
    }
}

/// Tone of the generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "String")]
pub enum Tone {
    Formal,
    Friendly,
    #[default]
    Professional,
    Humorous,
    Informal,
}

impl Tone {
    /// Wire code, also the word used in the composed instruction
    pub fn code(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Friendly => "friendly",
            Self::Professional => "professional",
            Self::Humorous => "humorous",
            Self::Informal => "informal",
        }
    }

    /// Parse a code or form label. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "formal" | "正式" => Some(Self::Formal),
            "friendly" | "友好" => Some(Self::Friendly),
            "professional" | "专业" => Some(Self::Professional),
            "humorous" | "幽默" => Some(Self::Humorous),
            "informal" | "非正式" => Some(Self::Informal),
            _ => None,
        }
    }

    /// Parse leniently: unrecognized values become the default (professional)
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl From<Option<Value>> for Tone {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::parse_or_default(&s),
            _ => Self::default(),
        }
    }
}

impl From<Tone> for String {
    fn from(value: Tone) -> Self {
        value.code().to_string()
    }
}

/// Generation request, the body of `POST /api/generate`.
///
/// Missing string fields deserialize as empty so that absence surfaces as a
/// validation failure rather than a body rejection. Options of the wrong JSON
/// type fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tone: Tone,
    /// Persona appended verbatim to the instruction
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            keywords: String::new(),
            description: String::new(),
            language: Language::default(),
            tone: Tone::default(),
            role: None,
        }
    }
}

impl GenerationRequest {
    pub fn new(
        model: impl Into<String>,
        keywords: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            keywords: keywords.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Names of the required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("model", &self.model),
            ("keywords", &self.keywords),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// True when model, keywords and description are all present
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The persona as given, unless it is absent or blank
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.trim().is_empty())
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Success body of the relay endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
}

/// Machine-readable failure category carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingParameters,
    InvalidBody,
    MissingCredential,
    UpstreamRateLimited,
    UpstreamError,
    UpstreamUnreachable,
    InvalidResponse,
    #[serde(other)]
    Unknown,
}

/// Failure body of the relay endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default = "unknown_kind")]
    pub kind: ErrorKind,
}

fn unknown_kind() -> ErrorKind {
    ErrorKind::Unknown
}
