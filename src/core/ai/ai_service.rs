use super::models::{AiConfig, AiError};
use async_trait::async_trait;

/// Port for the external text-generation service: one prompt string in, one
/// response string out. Providers own transport, auth, and wire formats.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn generate(&self, prompt: &str, config: &AiConfig) -> Result<String, AiError>;
}

// Blanket implementation for Box<dyn AiProvider>
// This allows us to use trait objects where the provider is chosen at
// runtime, while services stay generic over the trait.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn generate(&self, prompt: &str, config: &AiConfig) -> Result<String, AiError> {
        (**self).generate(prompt, config).await
    }
}

/// Wraps a provider with the fixed generation settings for diary feedback.
pub struct FeedbackService<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> FeedbackService<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }

    /// Requests reflective feedback for an already-composed prompt.
    pub async fn reflect(&self, prompt: &str) -> Result<String, AiError> {
        let raw = self.provider.generate(prompt, &self.config).await?;

        let text = raw.trim();
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedProvider {
        response: String,
    }

    #[async_trait]
    impl AiProvider for CannedProvider {
        async fn generate(&self, _prompt: &str, _config: &AiConfig) -> Result<String, AiError> {
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn reflect_trims_provider_output() {
        let service = FeedbackService::new(
            CannedProvider {
                response: "  well done  \n".to_string(),
            },
            AiConfig::default(),
        );

        assert_eq!(service.reflect("prompt").await.unwrap(), "well done");
    }

    #[tokio::test]
    async fn blank_provider_output_is_an_error() {
        let service = FeedbackService::new(
            CannedProvider {
                response: "   \n".to_string(),
            },
            AiConfig::default(),
        );

        assert!(matches!(
            service.reflect("prompt").await,
            Err(AiError::EmptyResponse)
        ));
    }
}
