use std::sync::Arc;

use crate::config::{GenerationSettings, ProviderKind};
use crate::generation::error::GenerationError;
use crate::generation::providers::{
    OfflineProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use crate::generation::traits::GenerationProvider;

/// Build the configured provider.
///
/// The OpenAI-compatible provider needs an API key; the offline provider
/// needs nothing.
pub fn build_generation_provider(
    settings: &GenerationSettings,
) -> Result<Arc<dyn GenerationProvider>, GenerationError> {
    match settings.provider {
        ProviderKind::OpenAiCompatible => {
            let api_key = settings.api_key.clone().ok_or_else(|| {
                GenerationError::Config(
                    "no API key: set SAMD_API_KEY or OPENAI_API_KEY, or use --offline".to_string(),
                )
            })?;
            let config = OpenAiCompatibleConfig {
                api_key,
                base_url: settings.base_url.clone(),
                model: settings.model.clone(),
                temperature: settings.temperature,
                timeout: settings.timeout(),
            };
            Ok(Arc::new(OpenAiCompatibleProvider::new(config)?))
        }
        ProviderKind::Offline => Ok(Arc::new(OfflineProvider::new())),
    }
}
