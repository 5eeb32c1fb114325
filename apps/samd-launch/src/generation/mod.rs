//! # Text Generation
//!
//! The capability every assessment stage is driven through: given a role
//! instruction and a prompt, return free-form text or a typed failure.
//!
//! A provider performs exactly one request per `generate` call. Retry,
//! backoff and concurrency limits belong to the pipeline runner.

pub mod error;
pub mod factory;
pub mod providers;
pub mod traits;
pub mod types;

pub use error::GenerationError;
pub use factory::build_generation_provider;
pub use providers::{OfflineProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use traits::GenerationProvider;
pub use types::{GenerationRequest, GenerationResponse};
