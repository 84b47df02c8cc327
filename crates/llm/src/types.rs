//! Provider identification and defaults.

/// Default DashScope text generation endpoint.
pub const DASHSCOPE_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

/// Default Ollama base URL.
pub const OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default request timeout for generation, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    DashScope,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dashscope" | "qwen" => Some(Self::DashScope),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DashScope => "dashscope",
            Self::Ollama => "ollama",
        }
    }

    /// Endpoint used when the configuration names none.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::DashScope => DASHSCOPE_ENDPOINT,
            Self::Ollama => OLLAMA_ENDPOINT,
        }
    }

    /// Whether the provider refuses requests without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::DashScope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("dashscope"), Some(ProviderType::DashScope));
        assert_eq!(ProviderType::parse("Qwen"), Some(ProviderType::DashScope));
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("openai"), None);
    }

    #[test]
    fn test_api_key_requirement() {
        assert!(ProviderType::DashScope.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert_eq!(ProviderType::Ollama.as_str(), "ollama");
    }
}
