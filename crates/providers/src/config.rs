/// Provider request shaping, selected by `AI_PROVIDER`. Mirrors the
/// teacher's `api_provider` dispatch in `semantic/src/api.rs`, generalized
/// to cover both embedding and completion payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    HuggingFace,
    Custom,
}

impl ProviderKind {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            "hf" | "huggingface" => ProviderKind::HuggingFace,
            _ => ProviderKind::Custom,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub provider: ProviderKind,
    pub model: String,
    pub dimension: usize,
    pub concurrency_cap: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: None,
            provider: ProviderKind::Custom,
            model: "text-embedding".into(),
            dimension: 384,
            concurrency_cap: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub provider: ProviderKind,
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: None,
            provider: ProviderKind::Custom,
            model: "text-completion".into(),
        }
    }
}
