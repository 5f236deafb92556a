//! OpenAI 互換 chat completions クライアント。
//!
//! `response_format: json_schema` で構造化出力を要求し、受信した JSON を同じスキーマで
//! 検証してから返す。タイムアウト・接続エラー・5xx・429 はバックオフ付きで再試行する。

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::validate_json;
use crate::util::retry::{RetryConfig, is_retryable_error, is_retryable_status};

const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// 長いエラーボディを切り詰める。
pub(crate) fn truncate_error_message(msg: &str) -> String {
    let char_count = msg.chars().count();
    if char_count <= MAX_ERROR_MESSAGE_LENGTH {
        return msg.to_string();
    }
    let truncated: String = msg.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{truncated}... (truncated, {char_count} chars)")
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// 構造化出力を返す 1 回の問い合わせ。
#[derive(Debug, Clone, Copy)]
pub struct StructuredPrompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
    /// `response_format` に載せるスキーマ名。
    pub schema_name: &'a str,
    pub schema: &'a Value,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    base_url: Url,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl LlmClient {
    /// # Errors
    /// HTTP クライアントの構築またはベース URL の解析に失敗した場合。
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build llm client")?;

        // 相対パスの join で末尾セグメントが落ちないようにする
        let mut raw = base_url.into();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).context("invalid llm base URL")?;

        Ok(Self {
            client,
            base_url,
            model: model.into(),
            api_key: None,
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base_url: impl Into<String>) -> Self {
        Self::new(base_url, "test-model", Duration::from_secs(5))
            .expect("test client")
            .with_retry(RetryConfig::new(3, 1, 2))
    }

    /// `GET {base}/models` が成功すれば到達可能とみなす。
    ///
    /// # Errors
    /// 接続失敗またはエラーステータスの場合。
    pub async fn health_check(&self) -> Result<()> {
        let url = self
            .base_url
            .join("models")
            .context("failed to build llm health URL")?;

        self.authorized(self.client.get(url))
            .send()
            .await
            .context("llm health request failed")?
            .error_for_status()
            .context("llm health endpoint returned error status")?;

        Ok(())
    }

    /// スキーマ制約付きで問い合わせ、検証済みの JSON を返す。
    ///
    /// # Errors
    /// 送信失敗、エラーステータス、空応答、スキーマ不一致のいずれかの場合。
    pub async fn complete_structured(&self, prompt: StructuredPrompt<'_>) -> Result<Value> {
        let url = self
            .base_url
            .join("chat/completions")
            .context("failed to build chat completions URL")?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt.user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: prompt.schema_name,
                    schema: wire_schema(prompt.schema),
                    strict: true,
                },
            },
        };

        debug!(
            model = %self.model,
            schema = prompt.schema_name,
            prompt_chars = prompt.user.chars().count(),
            "sending chat completion request"
        );

        let response = self.post_with_retry(&url, &request).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let truncated_body = truncate_error_message(&body);
            return Err(anyhow!(
                "chat completions endpoint returned error status {status}: {truncated_body}"
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to deserialize chat completion response")?;
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;
        if let Some(refusal) = message.refusal {
            return Err(anyhow!(
                "model refused structured output: {}",
                truncate_error_message(&refusal)
            ));
        }
        let content = message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("chat completion returned empty content"))?;

        let output: Value = serde_json::from_str(&content).with_context(|| {
            format!(
                "structured output is not valid JSON: {}",
                truncate_error_message(&content)
            )
        })?;

        let validation = validate_json(prompt.schema, &output);
        if !validation.valid {
            warn!(
                schema = prompt.schema_name,
                errors = ?validation.errors,
                "structured output failed JSON Schema validation"
            );
            return Err(anyhow!(
                "{} output validation failed: {:?}",
                prompt.schema_name,
                validation.errors
            ));
        }

        Ok(output)
    }

    async fn post_with_retry<T: Serialize + ?Sized>(&self, url: &Url, body: &T) -> Result<Response> {
        let mut attempt = 0;

        loop {
            let outcome = self
                .authorized(self.client.post(url.clone()))
                .json(body)
                .send()
                .await;
            attempt += 1;

            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(error) => is_retryable_error(error),
            };
            if !retryable {
                if attempt > 1 && outcome.is_ok() {
                    debug!(attempt, "chat completion request succeeded after retry");
                }
                return outcome.context("chat completion request failed");
            }
            if !self.retry.can_retry(attempt) {
                warn!(
                    attempt,
                    max_attempts = self.retry.max_attempts,
                    "chat completion request failed after all retries"
                );
                return outcome.context("chat completion request failed");
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                status = ?outcome.as_ref().ok().map(Response::status),
                "chat completion request failed, retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// `$schema` はプロバイダーの strict モードが受け付けないので外して送る。
fn wire_schema(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}
