use async_trait::async_trait;

use crate::generation::error::GenerationError;
use crate::generation::types::{GenerationRequest, GenerationResponse};

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}
