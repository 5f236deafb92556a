//! In-crate fakes for the capability traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::capability::{ContentGenerator, ContentScorer, Researcher, ScoreRequest, StageContext};
use super::models::{BlogPost, ContentType, Draft, LinkedInPost, Score, ScoreKind, Tweet};

/// Returns scripted scores in order, repeating the last one once the script runs out.
pub(crate) struct ScriptedCapabilities {
    scores: Mutex<VecDeque<i64>>,
    last_score: Mutex<i64>,
    delay: Duration,
    fail_research: bool,
}

impl ScriptedCapabilities {
    pub(crate) fn scoring(scores: &[i64]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            last_score: Mutex::new(scores.last().copied().unwrap_or(0)),
            delay: Duration::ZERO,
            fail_research: false,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing_research(mut self) -> Self {
        self.fail_research = true;
        self
    }

    pub(crate) fn into_context(self) -> StageContext {
        let caps = Arc::new(self);
        StageContext::new(caps.clone(), caps.clone(), caps)
    }
}

pub(crate) fn sample_draft(content_type: ContentType) -> Draft {
    match content_type {
        ContentType::BlogPost => Draft::Blog(BlogPost {
            title: "Rust in Production".into(),
            subtitle: "Lessons learned".into(),
            sections: vec!["Why".into(), "How".into()],
        }),
        ContentType::Tweet => Draft::Tweet(Tweet {
            content: "Rust ships fast".into(),
            hashtags: "#rust".into(),
        }),
        ContentType::LinkedinPost => Draft::LinkedIn(LinkedInPost {
            hook: "Stop guessing.".into(),
            content: "Measure first.".into(),
            call_to_action: "What do you measure?".into(),
        }),
    }
}

#[async_trait]
impl Researcher for ScriptedCapabilities {
    async fn research(&self, topic: &str) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_research {
            return Err(anyhow!("search backend unavailable"));
        }
        Ok(format!("notes about {topic}"))
    }
}

#[async_trait]
impl ContentGenerator for ScriptedCapabilities {
    async fn generate(&self, _prompt: &str, shape: ContentType) -> Result<Draft> {
        Ok(sample_draft(shape))
    }
}

#[async_trait]
impl ContentScorer for ScriptedCapabilities {
    async fn score(&self, _kind: ScoreKind, _request: &ScoreRequest<'_>) -> Result<Score> {
        let mut last = self.last_score.lock().map_err(|_| anyhow!("poisoned"))?;
        let next = self
            .scores
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .pop_front()
            .unwrap_or(*last);
        *last = next;
        Ok(Score::clamped(next, "scripted"))
    }
}
