//! 外部ケイパビリティ（調査・生成・採点）のインターフェース。
//!
//! 実装は起動時に一度だけ構築され、[`StageContext`] 経由で全ステージに渡される。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::models::{ContentType, Draft, Score, ScoreKind};

#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, topic: &str) -> Result<String>;
}

/// 形を指定した構造化生成。返り値は `shape` のレコード形でなければならない。
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, shape: ContentType) -> Result<Draft>;
}

/// 採点器への入力。`content` はドラフトを JSON 化したもの。
#[derive(Debug, Clone)]
pub struct ScoreRequest<'a> {
    pub content_type: ContentType,
    pub content: &'a str,
    pub topic: &'a str,
}

#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn score(&self, kind: ScoreKind, request: &ScoreRequest<'_>) -> Result<Score>;
}

/// ステージに渡す明示的なコンテキスト。
#[derive(Clone)]
pub struct StageContext {
    pub(crate) researcher: Arc<dyn Researcher>,
    pub(crate) generator: Arc<dyn ContentGenerator>,
    pub(crate) scorer: Arc<dyn ContentScorer>,
}

impl StageContext {
    pub fn new(
        researcher: Arc<dyn Researcher>,
        generator: Arc<dyn ContentGenerator>,
        scorer: Arc<dyn ContentScorer>,
    ) -> Self {
        Self {
            researcher,
            generator,
            scorer,
        }
    }
}
