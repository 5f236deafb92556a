//! 1 回の実行でステージ間を受け渡されるパイプライン状態。
//!
//! 状態は値で受け渡し、各ステージは自分の担当フィールドだけを書き換えた新しい状態を返す。

use anyhow::{Result, bail};

use super::models::{ContentType, Draft, Score};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    content_type: ContentType,
    topic: String,
    max_length: usize,
    research: String,
    draft: Option<Draft>,
    score: Option<Score>,
    generations: u32,
}

impl PipelineState {
    /// Init ステージ専用。検証済みの入力から初期状態を作る。
    pub(crate) fn new(content_type: ContentType, topic: String) -> Self {
        Self {
            content_type,
            topic,
            max_length: content_type.max_length(),
            research: String::new(),
            draft: None,
            score: None,
            generations: 0,
        }
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[must_use]
    pub fn research(&self) -> &str {
        &self.research
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    /// 完了した生成パスの回数（初回を含む）。
    #[must_use]
    pub fn generations(&self) -> u32 {
        self.generations
    }

    /// 初回生成以降に行った再生成の回数。
    #[must_use]
    pub fn regenerations(&self) -> u32 {
        self.generations.saturating_sub(1)
    }

    pub(crate) fn with_research(mut self, research: String) -> Self {
        self.research = research;
        self
    }

    /// ドラフトを上書きし生成回数を進める。
    ///
    /// # Errors
    /// ドラフトのバリアントが `content_type` と一致しない場合はエラーを返す。
    pub(crate) fn with_draft(mut self, draft: Draft) -> Result<Self> {
        if draft.content_type() != self.content_type {
            bail!(
                "generated {} does not match requested {}",
                draft.content_type(),
                self.content_type
            );
        }
        self.draft = Some(draft);
        self.generations += 1;
        Ok(self)
    }

    pub(crate) fn with_score(mut self, score: Score) -> Self {
        self.score = Some(score);
        self
    }

    /// 終端ステージ用。ドラフトとスコアを取り出して状態を破棄する。
    pub(crate) fn into_parts(self) -> (Option<Draft>, Option<Score>) {
        (self.draft, self.score)
    }
}
