pub mod capabilities;
pub mod llm;

pub use capabilities::{LlmContentGenerator, LlmContentScorer, LlmResearcher};
pub use llm::LlmClient;
