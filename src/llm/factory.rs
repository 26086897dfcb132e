//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{AskError, Result};
use crate::llm::{
    LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig, OpenAiClient, OpenAiConfig,
};

/// Creates an LLM client from the resolved configuration.
///
/// The OpenAI provider reads its key from `OPENAI_API_KEY`.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    create_client_with_key(config, std::env::var("OPENAI_API_KEY").ok())
}

/// Creates an LLM client, using `api_key` for providers that need one.
pub fn create_client_with_key(
    config: &LlmConfig,
    api_key: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    let provider: LlmProvider = config.provider.parse().map_err(AskError::config)?;

    match provider {
        LlmProvider::Ollama => {
            let mut ollama = OllamaConfig::new(&config.model).with_timeout(config.timeout_secs);
            if let Some(url) = &config.base_url {
                ollama = ollama.with_url(url);
            }
            Ok(Box::new(OllamaClient::new(ollama)?))
        }
        LlmProvider::OpenAi => {
            let key = api_key
                .ok_or_else(|| AskError::llm("No API key configured. Set OPENAI_API_KEY."))?;
            let mut openai =
                OpenAiConfig::new(key, &config.model).with_timeout(config.timeout_secs);
            if let Some(url) = &config.base_url {
                openai = openai.with_url(url);
            }
            Ok(Box::new(OpenAiClient::new(openai)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_mock_client() {
        assert!(create_client_with_key(&config("mock"), None).is_ok());
    }

    #[test]
    fn test_create_ollama_client() {
        let mut cfg = config("ollama");
        cfg.base_url = Some("http://gpu-box:11434".to_string());
        cfg.timeout_secs = Some(30);
        assert!(create_client_with_key(&cfg, None).is_ok());
    }

    #[test]
    fn test_create_openai_without_key_fails() {
        let err = create_client_with_key(&config("openai"), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn test_create_openai_with_provided_key() {
        let result = create_client_with_key(&config("openai"), Some("test-key".to_string()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = create_client_with_key(&config("anthropic"), None)
            .err()
            .unwrap();
        assert!(matches!(err, AskError::Config(_)));
    }
}
