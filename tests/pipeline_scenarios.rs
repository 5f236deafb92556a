use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rstest::rstest;

use content_pipeline::pipeline::{
    BlogPost, ContentGenerator, ContentPipeline, ContentRequest, ContentScorer, ContentType,
    Draft, LinkedInPost, PipelineError, QualityPolicy, Researcher, Score, ScoreKind, ScoreRequest,
    Stage, StageContext, Tweet, ValidationError,
};

#[derive(Default)]
struct Recorder {
    prompts: Vec<String>,
    scored_with: Vec<ScoreKind>,
    scored_content: Vec<String>,
}

struct FakeCapabilities {
    scores: Mutex<VecDeque<i64>>,
    recorder: Mutex<Recorder>,
    research: ResearchReply,
    wrong_shape: bool,
}

#[derive(Clone, Copy)]
enum ResearchReply {
    Findings,
    Blank,
    Unavailable,
}

impl FakeCapabilities {
    fn scripted(scores: &[i64], research: ResearchReply, wrong_shape: bool) -> Arc<Self> {
        Arc::new(Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            recorder: Mutex::new(Recorder::default()),
            research,
            wrong_shape,
        })
    }

    fn new(scores: &[i64]) -> Arc<Self> {
        Self::scripted(scores, ResearchReply::Findings, false)
    }

    fn with_failing_research() -> Arc<Self> {
        Self::scripted(&[], ResearchReply::Unavailable, false)
    }

    fn with_blank_research() -> Arc<Self> {
        Self::scripted(&[9], ResearchReply::Blank, false)
    }

    fn with_wrong_shape() -> Arc<Self> {
        Self::scripted(&[9], ResearchReply::Findings, true)
    }

    fn prompts(&self) -> Vec<String> {
        self.recorder.lock().expect("recorder").prompts.clone()
    }

    fn scored_with(&self) -> Vec<ScoreKind> {
        self.recorder.lock().expect("recorder").scored_with.clone()
    }

    fn scored_content(&self) -> Vec<String> {
        self.recorder.lock().expect("recorder").scored_content.clone()
    }
}

#[async_trait]
impl Researcher for FakeCapabilities {
    async fn research(&self, topic: &str) -> Result<String> {
        match self.research {
            ResearchReply::Findings => Ok(format!(
                "Key findings about {topic}: adoption doubled in 2025."
            )),
            ResearchReply::Blank => Ok("  \n ".to_string()),
            ResearchReply::Unavailable => Err(anyhow!("search backend unavailable")),
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeCapabilities {
    async fn generate(&self, prompt: &str, shape: ContentType) -> Result<Draft> {
        let generation = {
            let mut recorder = self.recorder.lock().expect("recorder");
            recorder.prompts.push(prompt.to_string());
            recorder.prompts.len()
        };
        let shape = if self.wrong_shape {
            ContentType::BlogPost
        } else {
            shape
        };
        Ok(match shape {
            ContentType::BlogPost => Draft::Blog(BlogPost {
                title: format!("Draft {generation}"),
                subtitle: "Subtitle".into(),
                sections: vec!["Intro".into(), "Body".into()],
            }),
            ContentType::Tweet => Draft::Tweet(Tweet {
                content: format!("Tweet draft {generation}"),
                hashtags: "#ai #content".into(),
            }),
            ContentType::LinkedinPost => Draft::LinkedIn(LinkedInPost {
                hook: format!("Hook {generation}"),
                content: "Body".into(),
                call_to_action: "Comment below".into(),
            }),
        })
    }
}

#[async_trait]
impl ContentScorer for FakeCapabilities {
    async fn score(&self, kind: ScoreKind, request: &ScoreRequest<'_>) -> Result<Score> {
        {
            let mut recorder = self.recorder.lock().expect("recorder");
            recorder.scored_with.push(kind);
            recorder.scored_content.push(request.content.to_string());
        }
        let score = self
            .scores
            .lock()
            .expect("scores")
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted score left"))?;
        Ok(Score::clamped(score, format!("scored {score}")))
    }
}

fn pipeline(caps: &Arc<FakeCapabilities>, policy: QualityPolicy) -> ContentPipeline {
    let context = StageContext::new(caps.clone(), caps.clone(), caps.clone());
    ContentPipeline::new(context, policy).expect("standard wiring is valid")
}

#[tokio::test]
async fn tweet_scoring_eight_finishes_in_one_pass() {
    let caps = FakeCapabilities::new(&[8]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("tweet", "AI in marketing"))
        .await
        .expect("run completes");

    assert_eq!(outcome.content_type, ContentType::Tweet);
    assert_eq!(outcome.score.score, 8);
    assert_eq!(outcome.generations, 1);
    assert!(!outcome.best_effort);
    assert!(matches!(outcome.draft, Draft::Tweet(ref tweet) if tweet.content == "Tweet draft 1"));
    assert_eq!(
        outcome.trace,
        vec![
            Stage::Init,
            Stage::Research,
            Stage::Generate(ContentType::Tweet),
            Stage::ScoreVirality,
            Stage::QualityGate,
            Stage::Finalize,
        ]
    );
    assert_eq!(caps.scored_with(), vec![ScoreKind::Virality]);
}

#[rstest]
#[case("tweet", ContentType::Tweet, r#""content":"Tweet draft 1""#)]
#[case("linkedin_post", ContentType::LinkedinPost, r#""hook":"Hook 1""#)]
#[tokio::test]
async fn low_score_triggers_one_revision_of_the_same_type(
    #[case] requested: &str,
    #[case] content_type: ContentType,
    #[case] first_draft_marker: &str,
) {
    let caps = FakeCapabilities::new(&[4, 9]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new(requested, "Remote work"))
        .await
        .expect("run completes");

    assert_eq!(outcome.content_type, content_type);
    assert_eq!(outcome.generations, 2);
    assert_eq!(outcome.score.score, 9);
    assert!(!outcome.best_effort);

    let prompts = caps.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("Improve the existing draft"));
    assert!(prompts[0].contains("adoption doubled in 2025"));
    assert!(prompts[1].contains("Improve the existing draft"));
    assert!(prompts[1].contains(first_draft_marker));

    let generate_count = outcome
        .trace
        .iter()
        .filter(|stage| **stage == Stage::Generate(content_type))
        .count();
    assert_eq!(generate_count, 2);
    assert_eq!(caps.scored_with(), vec![ScoreKind::Virality; 2]);
    assert_eq!(outcome.trace.last(), Some(&Stage::Finalize));
}

#[tokio::test]
async fn revised_linkedin_post_replaces_the_first_draft() {
    let caps = FakeCapabilities::new(&[4, 9]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("linkedin_post", "Remote work"))
        .await
        .expect("run completes");

    assert!(matches!(outcome.draft, Draft::LinkedIn(ref post) if post.hook == "Hook 2"));
}

#[rstest]
#[case(7, 1)]
#[case(10, 1)]
#[case(6, 2)]
#[tokio::test]
async fn threshold_is_inclusive(#[case] first_score: i64, #[case] expected_generations: u32) {
    let caps = FakeCapabilities::new(&[first_score, 9]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("tweet", "Rust"))
        .await
        .expect("run completes");
    assert_eq!(outcome.generations, expected_generations);
}

#[tokio::test]
async fn blog_post_is_scored_for_seo_with_serialized_draft() {
    let caps = FakeCapabilities::new(&[9]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("blog_post", "Edge computing"))
        .await
        .expect("run completes");

    assert_eq!(caps.scored_with(), vec![ScoreKind::Seo]);
    assert!(outcome.trace.contains(&Stage::ScoreSeo));
    assert!(!outcome.trace.contains(&Stage::ScoreVirality));

    let content: serde_json::Value =
        serde_json::from_str(&caps.scored_content()[0]).expect("scored content is json");
    assert_eq!(content["title"], "Draft 1");
}

#[tokio::test]
async fn exhausted_budget_finalizes_best_effort() {
    let caps = FakeCapabilities::new(&[3, 3, 3]);
    let outcome = pipeline(&caps, QualityPolicy::new(7, 2))
        .run(ContentRequest::new("tweet", "Quantum"))
        .await
        .expect("best effort is still a result");

    assert!(outcome.best_effort);
    assert_eq!(outcome.generations, 3);
    assert_eq!(outcome.score.score, 3);
    assert_eq!(outcome.trace.last(), Some(&Stage::FinalizeBestEffort));
    assert!(!outcome.trace.contains(&Stage::Finalize));
}

#[tokio::test]
async fn zero_regenerations_finalizes_after_first_pass() {
    let caps = FakeCapabilities::new(&[1]);
    let outcome = pipeline(&caps, QualityPolicy::new(7, 0))
        .run(ContentRequest::new("blog_post", "Databases"))
        .await
        .expect("run completes");

    assert!(outcome.best_effort);
    assert_eq!(outcome.generations, 1);
}

#[tokio::test]
async fn research_failure_aborts_the_run() {
    let caps = FakeCapabilities::with_failing_research();
    let error = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("tweet", "Rust"))
        .await
        .expect_err("research failure aborts");

    assert!(matches!(
        error,
        PipelineError::Capability {
            stage: Stage::Research,
            ..
        }
    ));
    assert!(caps.prompts().is_empty());
}

#[tokio::test]
async fn blank_research_is_rejected_as_malformed_output() {
    let caps = FakeCapabilities::with_blank_research();
    let error = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("blog_post", "Rust"))
        .await
        .expect_err("blank research aborts");

    match error {
        PipelineError::Capability { stage, source } => {
            assert_eq!(stage, Stage::Research);
            assert!(source.to_string().contains("empty text"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(caps.prompts().is_empty());
}

#[tokio::test]
async fn mismatched_shape_aborts_at_generate() {
    let caps = FakeCapabilities::with_wrong_shape();
    let error = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("tweet", "Rust"))
        .await
        .expect_err("shape mismatch aborts");

    match error {
        PipelineError::Capability { stage, source } => {
            assert_eq!(stage, Stage::Generate(ContentType::Tweet));
            assert!(source.to_string().contains("does not match"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(caps.scored_with().is_empty());
}

#[rstest]
#[case("newsletter", "Rust", ValidationError::UnknownContentType("newsletter".into()))]
#[case("tweet", "", ValidationError::EmptyTopic)]
#[case("blog_post", " \t ", ValidationError::EmptyTopic)]
#[tokio::test]
async fn invalid_requests_fail_before_any_capability_call(
    #[case] content_type: &str,
    #[case] topic: &str,
    #[case] expected: ValidationError,
) {
    let caps = FakeCapabilities::new(&[9]);
    let error = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new(content_type, topic))
        .await
        .expect_err("validation fails");

    assert!(matches!(error, PipelineError::Validation(ref inner) if *inner == expected));
    assert!(caps.prompts().is_empty());
}

#[tokio::test]
async fn topic_is_trimmed_and_outcome_serializes() {
    let caps = FakeCapabilities::new(&[9]);
    let outcome = pipeline(&caps, QualityPolicy::default())
        .run(ContentRequest::new("tweet", "  Rust async  "))
        .await
        .expect("run completes");
    assert_eq!(outcome.topic, "Rust async");

    let json = serde_json::to_value(&outcome).expect("outcome serializes");
    assert_eq!(json["content_type"], "tweet");
    assert_eq!(json["trace"][0], "init");
    assert_eq!(json["trace"][2], "generate_tweet");
    assert_eq!(json["draft"]["hashtags"], "#ai #content");
}
