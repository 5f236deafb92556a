//! Typed event router for the content pipeline.
//!
//! Stages emit [`Event`]s; the [`TransitionTable`] maps each event (and the current
//! state, for conditional branches) to the next stages to run.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::models::ContentType;
use super::state::PipelineState;

/// Named unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    Research,
    Generate(ContentType),
    ScoreSeo,
    ScoreVirality,
    QualityGate,
    Finalize,
    FinalizeBestEffort,
}

impl Stage {
    /// Every stage the engine knows about, entry stage first.
    pub const ALL: [Stage; 10] = [
        Stage::Init,
        Stage::Research,
        Stage::Generate(ContentType::BlogPost),
        Stage::Generate(ContentType::Tweet),
        Stage::Generate(ContentType::LinkedinPost),
        Stage::ScoreSeo,
        Stage::ScoreVirality,
        Stage::QualityGate,
        Stage::Finalize,
        Stage::FinalizeBestEffort,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Research => "research",
            Stage::Generate(ContentType::BlogPost) => "generate_blog_post",
            Stage::Generate(ContentType::Tweet) => "generate_tweet",
            Stage::Generate(ContentType::LinkedinPost) => "generate_linkedin_post",
            Stage::ScoreSeo => "check_seo",
            Stage::ScoreVirality => "check_virality",
            Stage::QualityGate => "quality_gate",
            Stage::Finalize => "finalize",
            Stage::FinalizeBestEffort => "finalize_best_effort",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Finalize | Stage::FinalizeBestEffort)
    }

    /// Events this stage may emit on completion.
    #[must_use]
    pub fn emits(self) -> Vec<Event> {
        match self {
            Stage::Init => vec![Event::Initialized],
            Stage::Research => vec![Event::ResearchDone],
            Stage::Generate(content_type) => vec![Event::DraftReady(content_type)],
            Stage::ScoreSeo | Stage::ScoreVirality => vec![Event::ScoreReady],
            Stage::QualityGate => {
                let mut events = vec![Event::CheckPassed, Event::RegenerationBudgetExhausted];
                events.extend(ContentType::ALL.into_iter().map(Event::Regenerate));
                events
            }
            Stage::Finalize | Stage::FinalizeBestEffort => Vec::new(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Completion signal emitted by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Initialized,
    ResearchDone,
    DraftReady(ContentType),
    ScoreReady,
    CheckPassed,
    Regenerate(ContentType),
    RegenerationBudgetExhausted,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Initialized => f.write_str("initialized"),
            Event::ResearchDone => f.write_str("research_done"),
            Event::DraftReady(content_type) => write!(f, "{content_type}_ready"),
            Event::ScoreReady => f.write_str("score_ready"),
            Event::CheckPassed => f.write_str("check_passed"),
            Event::Regenerate(content_type) => write!(f, "regenerate_{content_type}"),
            Event::RegenerationBudgetExhausted => f.write_str("regeneration_budget_exhausted"),
        }
    }
}

/// Where a listener sends the pipeline once triggered.
#[derive(Clone)]
pub enum Target {
    Static(Stage),
    /// State-dependent choice among `candidates`.
    Branch {
        name: &'static str,
        candidates: Vec<Stage>,
        choose: fn(&PipelineState) -> Stage,
    },
}

impl Target {
    fn resolve(&self, state: &PipelineState) -> Stage {
        match self {
            Target::Static(stage) => *stage,
            Target::Branch { choose, .. } => choose(state),
        }
    }

    fn candidates(&self) -> &[Stage] {
        match self {
            Target::Static(stage) => std::slice::from_ref(stage),
            Target::Branch { candidates, .. } => candidates,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Static(stage) => f.debug_tuple("Static").field(stage).finish(),
            Target::Branch {
                name, candidates, ..
            } => f
                .debug_struct("Branch")
                .field("name", name)
                .field("candidates", candidates)
                .finish_non_exhaustive(),
        }
    }
}

/// A registration: fire `target` when any of `triggers` is emitted.
#[derive(Debug, Clone)]
pub struct Listener {
    triggers: Vec<Event>,
    target: Target,
}

impl Listener {
    fn listens_to(&self, event: Event) -> bool {
        self.triggers.contains(&event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("event {event} emitted by {stage} has no listener")]
    UnhandledEvent { stage: Stage, event: Event },
    #[error("stage {0} is not reachable from any listener")]
    UnreachableStage(Stage),
}

#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    listeners: Vec<Listener>,
}

impl TransitionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(self, event: Event, stage: Stage) -> Self {
        self.on_any(&[event], stage)
    }

    /// OR-condition: `stage` fires once for each qualifying event.
    #[must_use]
    pub fn on_any(mut self, events: &[Event], stage: Stage) -> Self {
        self.listeners.push(Listener {
            triggers: events.to_vec(),
            target: Target::Static(stage),
        });
        self
    }

    #[must_use]
    pub fn branch(
        mut self,
        event: Event,
        name: &'static str,
        candidates: &[Stage],
        choose: fn(&PipelineState) -> Stage,
    ) -> Self {
        self.listeners.push(Listener {
            triggers: vec![event],
            target: Target::Branch {
                name,
                candidates: candidates.to_vec(),
                choose,
            },
        });
        self
    }

    /// Wiring of the content pipeline.
    #[must_use]
    pub fn content_pipeline() -> Self {
        let mut table = Self::new()
            .on(Event::Initialized, Stage::Research)
            .branch(
                Event::ResearchDone,
                "content_type",
                &ContentType::ALL.map(Stage::Generate),
                |state| Stage::Generate(state.content_type()),
            )
            .on(Event::DraftReady(ContentType::BlogPost), Stage::ScoreSeo)
            .on_any(
                &[
                    Event::DraftReady(ContentType::Tweet),
                    Event::DraftReady(ContentType::LinkedinPost),
                ],
                Stage::ScoreVirality,
            )
            .on(Event::ScoreReady, Stage::QualityGate)
            .on(Event::CheckPassed, Stage::Finalize)
            .on(Event::RegenerationBudgetExhausted, Stage::FinalizeBestEffort);
        for content_type in ContentType::ALL {
            table = table.on(
                Event::Regenerate(content_type),
                Stage::Generate(content_type),
            );
        }
        table
    }

    /// Stages to run for `event`. A stage appears at most once per dispatch.
    #[must_use]
    pub fn resolve(&self, event: Event, state: &PipelineState) -> Vec<Stage> {
        let mut next = Vec::new();
        for listener in self.listeners.iter().filter(|l| l.listens_to(event)) {
            let stage = listener.target.resolve(state);
            if !next.contains(&stage) {
                next.push(stage);
            }
        }
        next
    }

    /// Checks every emitted event is handled and every non-entry stage is reachable.
    ///
    /// # Errors
    /// Returns the first [`TableError`] found.
    pub fn validate(&self) -> Result<(), TableError> {
        for stage in Stage::ALL {
            for event in stage.emits() {
                if !self.listeners.iter().any(|l| l.listens_to(event)) {
                    return Err(TableError::UnhandledEvent { stage, event });
                }
            }
        }
        for stage in Stage::ALL.into_iter().filter(|s| *s != Stage::Init) {
            let reachable = self
                .listeners
                .iter()
                .any(|l| l.target.candidates().contains(&stage));
            if !reachable {
                return Err(TableError::UnreachableStage(stage));
            }
        }
        Ok(())
    }

    /// Mermaid flowchart of the wiring, one edge per (stage, event, target).
    #[must_use]
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        for stage in Stage::ALL {
            for event in stage.emits() {
                for listener in self.listeners.iter().filter(|l| l.listens_to(event)) {
                    let label = match &listener.target {
                        Target::Static(_) => event.to_string(),
                        Target::Branch { name, .. } => format!("{event} by {name}"),
                    };
                    for target in listener.target.candidates() {
                        out.push_str(&format!("    {stage} -->|{label}| {target}\n"));
                    }
                }
            }
        }
        out
    }
}
