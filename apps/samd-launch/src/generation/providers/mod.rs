pub mod offline;
pub mod openai_compatible;

pub use offline::OfflineProvider;
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
