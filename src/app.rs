use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;

use crate::{
    api,
    clients::{LlmClient, LlmContentGenerator, LlmContentScorer, LlmResearcher},
    config::Config,
    observability::Telemetry,
    pipeline::{ContentPipeline, StageContext},
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    telemetry: Telemetry,
    llm_client: Arc<LlmClient>,
    pipeline: Arc<ContentPipeline>,
    run_timeout: Duration,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn llm_client(&self) -> Arc<LlmClient> {
        Arc::clone(&self.registry.llm_client)
    }

    pub(crate) fn pipeline(&self) -> Arc<ContentPipeline> {
        Arc::clone(&self.registry.pipeline)
    }

    pub(crate) fn run_timeout(&self) -> Duration {
        self.registry.run_timeout
    }
}

impl ComponentRegistry {
    /// 構成情報から LLM クライアント・ケイパビリティ・パイプラインを組み立てる。
    ///
    /// # Errors
    /// Telemetry の初期化、HTTP クライアント構築、遷移表の検証のいずれかが失敗した場合。
    pub fn build(config: &Config) -> Result<Self> {
        let telemetry = Telemetry::new(config)?;
        let llm_client = Arc::new(
            LlmClient::new(
                config.llm_base_url(),
                config.llm_model(),
                config.llm_request_timeout(),
            )?
            .with_api_key(config.llm_api_key().map(str::to_string))
            .with_retry(config.retry_config()),
        );

        let context = StageContext::new(
            Arc::new(LlmResearcher::new(Arc::clone(&llm_client))),
            Arc::new(LlmContentGenerator::new(Arc::clone(&llm_client))),
            Arc::new(LlmContentScorer::new(Arc::clone(&llm_client))),
        );
        let pipeline = ContentPipeline::new(context, config.quality_policy())
            .context("content pipeline wiring is invalid")?
            .with_metrics(telemetry.metrics());

        tracing::info!(
            model = config.llm_model(),
            threshold = config.quality_threshold(),
            max_regenerations = config.max_regenerations(),
            "component registry built"
        );

        Ok(Self::from_parts(
            telemetry,
            llm_client,
            pipeline,
            config.pipeline_run_timeout(),
        ))
    }

    /// 任意のケイパビリティで組み立てたパイプラインからレジストリを作る。
    #[must_use]
    pub fn from_parts(
        telemetry: Telemetry,
        llm_client: Arc<LlmClient>,
        pipeline: ContentPipeline,
        run_timeout: Duration,
    ) -> Self {
        Self {
            telemetry,
            llm_client,
            pipeline: Arc::new(pipeline),
            run_timeout,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> Arc<ContentPipeline> {
        Arc::clone(&self.pipeline)
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;
    use crate::pipeline::{QualityPolicy, test_support::ScriptedCapabilities};

    /// フェイクのケイパビリティで組んだルーター。`llm_base_url` は readiness 用。
    pub(crate) fn test_router(
        caps: ScriptedCapabilities,
        llm_base_url: &str,
        run_timeout: Duration,
    ) -> Router {
        let telemetry = Telemetry::without_tracing().expect("telemetry");
        let pipeline = ContentPipeline::new(caps.into_context(), QualityPolicy::default())
            .expect("valid table")
            .with_metrics(telemetry.metrics());
        let llm = Arc::new(LlmClient::new_for_test(llm_base_url));
        build_router(ComponentRegistry::from_parts(
            telemetry,
            llm,
            pipeline,
            run_timeout,
        ))
    }

    #[tokio::test]
    async fn component_registry_builds_from_env() {
        let config = {
            let _lock = ENV_MUTEX.lock().expect("env mutex");
            // SAFETY: test code adjusts deterministic environment state sequentially.
            unsafe {
                std::env::set_var("LLM_BASE_URL", "http://localhost:18080/v1");
                std::env::remove_var("OTEL_EXPORTER_ENDPOINT");
                std::env::remove_var("QUALITY_THRESHOLD");
                std::env::remove_var("MAX_REGENERATIONS");
            }
            let config = Config::from_env().expect("config loads");
            unsafe {
                std::env::remove_var("LLM_BASE_URL");
            }
            config
        };

        let registry = ComponentRegistry::build(&config).expect("registry builds");
        assert_eq!(registry.pipeline().policy(), QualityPolicy::new(7, 3));
        assert_eq!(registry.llm_client.model(), "gpt-5-nano");

        let state = AppState::new(registry);
        state.telemetry().record_ready_probe();
        assert_eq!(state.run_timeout(), Duration::from_secs(600));
    }
}
