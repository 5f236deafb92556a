//! LLM-backed implementations of the research, generation and scoring capabilities.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::llm::{LlmClient, StructuredPrompt};
use crate::pipeline::capability::{ContentGenerator, ContentScorer, Researcher, ScoreRequest};
use crate::pipeline::models::{ContentType, Draft, MAX_SCORE, Score, ScoreKind};
use crate::schema::{RESEARCH_SCHEMA, SCORE_SCHEMA, draft_schema};

const RESEARCH_SYSTEM_PROMPT: &str = "You are a head researcher gathering information on a \
    topic so that writers can create high-quality content from it. Cover recent developments, \
    key statistics and expert opinions. Be concise and stay directly on the topic.";

const WRITER_SYSTEM_PROMPT: &str = "You are a professional content writer. Follow the \
    instructions exactly and answer only with the requested structure.";

#[derive(Debug, Deserialize)]
struct ResearchOutput {
    research: String,
}

#[derive(Debug, Deserialize)]
struct ScoreOutput {
    score: i64,
    reason: String,
}

pub struct LlmResearcher {
    llm: Arc<LlmClient>,
}

impl LlmResearcher {
    #[must_use]
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, topic: &str) -> Result<String> {
        let user = format!(
            "Conduct research on the topic '{topic}'. Produce a concise research report with \
             recent developments, key statistics and expert opinions that a writer can use \
             directly."
        );
        let output = self
            .llm
            .complete_structured(StructuredPrompt {
                system: RESEARCH_SYSTEM_PROMPT,
                user: &user,
                schema_name: "research",
                schema: &RESEARCH_SCHEMA,
            })
            .await?;
        let output: ResearchOutput =
            serde_json::from_value(output).context("failed to deserialize research output")?;
        Ok(output.research)
    }
}

pub struct LlmContentGenerator {
    llm: Arc<LlmClient>,
}

impl LlmContentGenerator {
    #[must_use]
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, prompt: &str, shape: ContentType) -> Result<Draft> {
        let output = self
            .llm
            .complete_structured(StructuredPrompt {
                system: WRITER_SYSTEM_PROMPT,
                user: prompt,
                schema_name: shape.as_str(),
                schema: draft_schema(shape),
            })
            .await?;
        Draft::from_value(shape, output)
            .with_context(|| format!("generated output is not a valid {shape}"))
    }
}

pub struct LlmContentScorer {
    llm: Arc<LlmClient>,
}

impl LlmContentScorer {
    #[must_use]
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

fn scoring_instructions(kind: ScoreKind, request: &ScoreRequest<'_>) -> (String, String) {
    let name = request.content_type.display_name();
    let topic = request.topic;
    let (system, criteria) = match kind {
        ScoreKind::Seo => (
            "You are an SEO specialist who reviews content before publication.",
            "keyword relevance to the topic, title and subtitle quality, section structure, \
             readability and how likely it is to rank for searches about the topic",
        ),
        ScoreKind::Virality => (
            "You are a social media strategist who predicts how content will perform.",
            "how strong the hook is, emotional pull, shareability, hashtag relevance and \
             how clearly it invites engagement",
        ),
    };
    let user = format!(
        "Evaluate the following {name} on the topic '{topic}'. Judge it on {criteria}. \
         Give an integer score from 0 to {MAX_SCORE}, where {MAX_SCORE} is ready to publish, \
         and a short reason that names the most important improvement.\n\n\
         <content>\n{content}\n</content>\n",
        content = request.content,
    );
    (system.to_string(), user)
}

#[async_trait]
impl ContentScorer for LlmContentScorer {
    async fn score(&self, kind: ScoreKind, request: &ScoreRequest<'_>) -> Result<Score> {
        let (system, user) = scoring_instructions(kind, request);
        let output = self
            .llm
            .complete_structured(StructuredPrompt {
                system: &system,
                user: &user,
                schema_name: "score",
                schema: &SCORE_SCHEMA,
            })
            .await?;
        let output: ScoreOutput =
            serde_json::from_value(output).context("failed to deserialize score output")?;
        debug!(kind = kind.as_str(), raw_score = output.score, "score received");
        Ok(Score::clamped(output.score, output.reason))
    }
}
