use samd_launch_core::{StageKind, StagePrompt};

/// One generation call: a system role instruction plus a user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub stage: StageKind,
    pub role_instruction: String,
    pub prompt: String,
}

impl From<StagePrompt> for GenerationRequest {
    fn from(p: StagePrompt) -> Self {
        Self {
            stage: p.stage,
            role_instruction: p.role_instruction,
            prompt: p.prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub provider: String,
    pub model: String,
    pub text: String,
    pub usage_tokens: Option<u64>,
}
