//! 生成ステージのプロンプト構築。
//!
//! 既存ドラフトが無ければ初回生成、あればリビジョン（改善）プロンプトを組み立てる。

use anyhow::{Context, Result};

use super::models::{ContentType, Draft};
use super::state::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    FirstPass,
    Revision,
}

impl GenerationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GenerationMode::FirstPass => "first_pass",
            GenerationMode::Revision => "revision",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub mode: GenerationMode,
    pub text: String,
}

/// 状態からプロンプトを作る。モードはドラフトの有無だけで決まる。
///
/// # Errors
/// 既存ドラフトのシリアライズに失敗した場合はエラーを返す。
pub fn build_generation_prompt(state: &PipelineState) -> Result<GenerationPrompt> {
    let content_type = state.content_type();
    match state.draft() {
        None => Ok(GenerationPrompt {
            mode: GenerationMode::FirstPass,
            text: first_pass(content_type, state),
        }),
        Some(draft) => Ok(GenerationPrompt {
            mode: GenerationMode::Revision,
            text: revision(content_type, state, draft)?,
        }),
    }
}

fn brief(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::BlogPost => {
            "The blog post should be well-structured, with a title, a subtitle and several \
             sections that each cover a different aspect of the topic. Keep it concise, \
             engaging and informative."
        }
        ContentType::Tweet => {
            "The tweet should be concise and engaging, capture the essence of the topic in a \
             way that resonates with the audience, and include relevant hashtags for \
             visibility."
        }
        ContentType::LinkedinPost => {
            "The LinkedIn post should open with a compelling hook, follow with informative \
             content that gives the reader real value, and close with a strong call to action \
             that invites engagement."
        }
    }
}

fn first_pass(content_type: ContentType, state: &PipelineState) -> String {
    format!(
        "Using the following research, create a {name} on the topic {topic}. {brief} \
         Base the content directly on the research and make use of its key insights. \
         Keep it within {max_length} words.\n\n\
         <research>\n{research}\n</research>\n",
        name = content_type.display_name(),
        topic = state.topic(),
        brief = brief(content_type),
        max_length = state.max_length(),
        research = state.research(),
    )
}

fn revision(content_type: ContentType, state: &PipelineState, draft: &Draft) -> Result<String> {
    let serialized = draft
        .to_json()
        .context("failed to serialize current draft for revision")?;
    let tag = content_type.as_str();
    Ok(format!(
        "The following is a {name} that was generated from research on the topic {topic}. \
         {brief} It may not be perfect: review it and improve it so that it better captures \
         the key insights from the research and engages the audience more effectively. \
         Improve the existing draft rather than starting over. \
         Keep it within {max_length} words.\n\n\
         <research>\n{research}\n</research>\n\n\
         <{tag}>\n{serialized}\n</{tag}>\n",
        name = content_type.display_name(),
        topic = state.topic(),
        brief = brief(content_type),
        max_length = state.max_length(),
        research = state.research(),
    ))
}
