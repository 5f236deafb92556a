//! Event-routed content pipeline: research, generate, score, gate, finalize.

pub mod capability;
pub mod error;
pub(crate) mod executor;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod router;
pub mod state;
pub mod stages;
#[cfg(test)]
pub(crate) mod test_support;

pub use capability::{ContentGenerator, ContentScorer, Researcher, ScoreRequest, StageContext};
pub use error::{PipelineError, ValidationError};
pub use models::{
    BlogPost, ContentRequest, ContentType, Draft, LinkedInPost, Score, ScoreKind, Tweet,
};
pub use orchestrator::{ContentOutcome, ContentPipeline};
pub use router::{Event, Stage, TableError, TransitionTable};
pub use stages::QualityPolicy;
