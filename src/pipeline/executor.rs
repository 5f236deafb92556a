use anyhow::anyhow;

use super::{
    capability::StageContext,
    error::PipelineError,
    models::ScoreKind,
    router::{Event, Stage},
    stages::{
        QualityPolicy,
        finalize::{FinalizedContent, finalize},
        gate::evaluate,
        generate::generate,
        research::research,
        score::score,
    },
    state::PipelineState,
};

/// 1 ステージ分の実行結果。
#[derive(Debug)]
pub(crate) enum StageOutcome {
    Continue { state: PipelineState, event: Event },
    Finished(FinalizedContent),
}

/// ステージ識別子から対応するステージ関数へディスパッチするヘルパー
pub(crate) struct StageExecutor<'a> {
    context: &'a StageContext,
    policy: &'a QualityPolicy,
}

impl<'a> StageExecutor<'a> {
    pub(crate) fn new(context: &'a StageContext, policy: &'a QualityPolicy) -> Self {
        Self { context, policy }
    }

    pub(crate) async fn execute(
        &self,
        stage: Stage,
        state: PipelineState,
    ) -> Result<StageOutcome, PipelineError> {
        let ctx = self.context;
        let result = match stage {
            // Init は入力検証を伴うためオーケストレーターが実行前に一度だけ走らせる
            Stage::Init => Err(anyhow!("init cannot be re-entered")),
            Stage::Research => research(state, ctx).await,
            Stage::Generate(content_type) => generate(content_type, state, ctx).await,
            Stage::ScoreSeo => score(ScoreKind::Seo, state, ctx).await,
            Stage::ScoreVirality => score(ScoreKind::Virality, state, ctx).await,
            Stage::QualityGate => evaluate(&state, self.policy).map(|event| (state, event)),
            Stage::Finalize => {
                return finalize(state, false)
                    .map(StageOutcome::Finished)
                    .map_err(|e| PipelineError::capability(stage, e));
            }
            Stage::FinalizeBestEffort => {
                return finalize(state, true)
                    .map(StageOutcome::Finished)
                    .map_err(|e| PipelineError::capability(stage, e));
            }
        };

        result
            .map(|(state, event)| StageOutcome::Continue { state, event })
            .map_err(|e| PipelineError::capability(stage, e))
    }
}
