//! コンテンツのレコード型とスコア。
//!
//! 生成ケイパビリティとの契約、および HTTP レスポンスの形として使われる。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// 生成対象のコンテンツ種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    BlogPost,
    Tweet,
    LinkedinPost,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [
        ContentType::BlogPost,
        ContentType::Tweet,
        ContentType::LinkedinPost,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentType::BlogPost => "blog_post",
            ContentType::Tweet => "tweet",
            ContentType::LinkedinPost => "linkedin_post",
        }
    }

    /// 種別ごとの長さ上限。
    #[must_use]
    pub const fn max_length(self) -> usize {
        match self {
            ContentType::Tweet => 100,
            ContentType::LinkedinPost => 500,
            ContentType::BlogPost => 800,
        }
    }

    /// ブログは SEO、ソーシャル投稿はバイラリティで採点する。
    #[must_use]
    pub const fn score_kind(self) -> ScoreKind {
        match self {
            ContentType::BlogPost => ScoreKind::Seo,
            ContentType::Tweet | ContentType::LinkedinPost => ScoreKind::Virality,
        }
    }

    /// ログやプロンプトに出す人間向けの名前。
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            ContentType::BlogPost => "blog post",
            ContentType::Tweet => "tweet",
            ContentType::LinkedinPost => "LinkedIn post",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "blog_post" => Ok(ContentType::BlogPost),
            "tweet" => Ok(ContentType::Tweet),
            "linkedin_post" => Ok(ContentType::LinkedinPost),
            other => Err(ValidationError::UnknownContentType(other.to_string())),
        }
    }
}

/// 実行の入力。検証前の生の値を保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub content_type: String,
    pub topic: String,
}

impl ContentRequest {
    pub fn new(content_type: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            topic: topic.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub content: String,
    /// 複数タグを 1 つの文字列にまとめたもの（例: `"#ai #content"`）。
    pub hashtags: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInPost {
    pub hook: String,
    pub content: String,
    pub call_to_action: String,
}

/// 現在のドラフト。`content_type` に対応するバリアントだけが存在しうる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Draft {
    Blog(BlogPost),
    Tweet(Tweet),
    LinkedIn(LinkedInPost),
}

impl Draft {
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Draft::Blog(_) => ContentType::BlogPost,
            Draft::Tweet(_) => ContentType::Tweet,
            Draft::LinkedIn(_) => ContentType::LinkedinPost,
        }
    }

    /// バリアントの中身だけを JSON 化する（リビジョン用プロンプトや採点に渡す形）。
    ///
    /// # Errors
    /// シリアライズに失敗した場合はエラーを返す。
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Draft::Blog(post) => serde_json::to_string(post),
            Draft::Tweet(tweet) => serde_json::to_string(tweet),
            Draft::LinkedIn(post) => serde_json::to_string(post),
        }
    }

    /// 指定された種別の形として JSON 値をデシリアライズする。
    ///
    /// # Errors
    /// 値が種別のレコード形に一致しない場合はエラーを返す。
    pub fn from_value(
        content_type: ContentType,
        value: serde_json::Value,
    ) -> serde_json::Result<Self> {
        Ok(match content_type {
            ContentType::BlogPost => Draft::Blog(serde_json::from_value(value)?),
            ContentType::Tweet => Draft::Tweet(serde_json::from_value(value)?),
            ContentType::LinkedinPost => Draft::LinkedIn(serde_json::from_value(value)?),
        })
    }

    /// ログ用の短い見出し。
    #[must_use]
    pub fn headline(&self) -> &str {
        match self {
            Draft::Blog(post) => &post.title,
            Draft::Tweet(tweet) => &tweet.content,
            Draft::LinkedIn(post) => &post.hook,
        }
    }
}

/// 採点器の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Seo,
    Virality,
}

impl ScoreKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ScoreKind::Seo => "seo",
            ScoreKind::Virality => "virality",
        }
    }
}

pub const MAX_SCORE: u8 = 10;

/// 品質スコア。採点のたびに丸ごと上書きされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub score: u8,
    pub reason: String,
}

impl Score {
    /// 生の値を 0..=10 に丸めてスコアを作る。
    #[must_use]
    pub fn clamped(raw: i64, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let clamped = raw.clamp(0, i64::from(MAX_SCORE));
        if clamped != raw {
            tracing::warn!(raw, clamped, "score outside 0..=10 was clamped");
        }
        Self {
            // clamp 済みなので u8 に収まる
            score: u8::try_from(clamped).unwrap_or(MAX_SCORE),
            reason,
        }
    }
}
