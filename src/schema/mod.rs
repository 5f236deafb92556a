//! JSON Schema 2020-12 定義。
//!
//! 生成・採点・調査ケイパビリティとの構造化出力の契約。LLM に `response_format` として
//! 渡し、受信後にも同じスキーマで検証する。

use once_cell::sync::Lazy;
use serde_json::{Value, json};

use crate::pipeline::models::ContentType;

/// スキーマ検証結果。
#[derive(Debug)]
pub(crate) struct ValidationResult {
    pub(crate) valid: bool,
    pub(crate) errors: Vec<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

pub(crate) fn validate_json(schema_json: &Value, instance: &Value) -> ValidationResult {
    match jsonschema::draft202012::new(schema_json) {
        Ok(validator) => {
            let errors: Vec<String> = validator
                .iter_errors(instance)
                .map(|e| format!("{} at {}", e, e.instance_path))
                .collect();
            if errors.is_empty() {
                ValidationResult::valid()
            } else {
                ValidationResult::invalid(errors)
            }
        }
        Err(e) => ValidationResult::invalid(vec![format!("Schema compilation error: {e}")]),
    }
}

pub(crate) static BLOG_POST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "subtitle": { "type": "string" },
            "sections": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["title", "subtitle", "sections"],
        "additionalProperties": false
    })
});

pub(crate) static TWEET_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "content": { "type": "string" },
            "hashtags": { "type": "string" }
        },
        "required": ["content", "hashtags"],
        "additionalProperties": false
    })
});

pub(crate) static LINKEDIN_POST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "hook": { "type": "string" },
            "content": { "type": "string" },
            "call_to_action": { "type": "string" }
        },
        "required": ["hook", "content", "call_to_action"],
        "additionalProperties": false
    })
});

/// 採点結果。範囲外の値は受信後に丸めるため、ここでは整数であることだけを要求する。
pub(crate) static SCORE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "score": { "type": "integer" },
            "reason": { "type": "string" }
        },
        "required": ["score", "reason"],
        "additionalProperties": false
    })
});

pub(crate) static RESEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "research": { "type": "string" }
        },
        "required": ["research"],
        "additionalProperties": false
    })
});

pub(crate) fn draft_schema(content_type: ContentType) -> &'static Value {
    match content_type {
        ContentType::BlogPost => &BLOG_POST_SCHEMA,
        ContentType::Tweet => &TWEET_SCHEMA,
        ContentType::LinkedinPost => &LINKEDIN_POST_SCHEMA,
    }
}
