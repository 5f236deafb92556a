use thiserror::Error;

use super::router::Stage;

/// 実行開始時の入力検証エラー。呼び出し元へそのまま返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid content type '{0}'. Must be 'blog_post', 'tweet', or 'linkedin_post'.")]
    UnknownContentType(String),
    #[error("The topic cannot be empty.")]
    EmptyTopic,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// ステージの失敗。ケイパビリティの呼び出し失敗、不正な出力、形の不一致を含む。
    #[error("{stage} stage failed")]
    Capability {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
    #[error("pipeline stalled after {last_stage} without reaching a terminal stage")]
    Stalled { last_stage: Stage },
    #[error("pipeline exceeded {limit} steps")]
    StepLimitExceeded { limit: usize },
}

impl PipelineError {
    pub(crate) fn capability(stage: Stage, source: anyhow::Error) -> Self {
        Self::Capability { stage, source }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// メトリクスのラベル用。
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Capability { .. } => "capability",
            Self::Stalled { .. } => "stalled",
            Self::StepLimitExceeded { .. } => "step_limit",
        }
    }
}
