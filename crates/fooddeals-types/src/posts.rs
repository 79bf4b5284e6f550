//! Posts, comments and feed ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A post as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Older server versions omit the counter.
    #[serde(default)]
    pub likes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub body: String,
}

/// Response of `GET /post/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithComments {
    pub post: Post,
    #[serde(default)]
    pub comment: Vec<Comment>,
}

/// Response of `POST /like`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeReceipt {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
}

/// Server-side ordering of the post list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "new")]
    Newest,
    #[serde(rename = "old")]
    Oldest,
    #[serde(rename = "likes")]
    MostLiked,
}

impl SortMode {
    /// Value of the `sorting` query parameter.
    pub fn as_query(self) -> &'static str {
        match self {
            SortMode::Newest => "new",
            SortMode::Oldest => "old",
            SortMode::MostLiked => "likes",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SortMode::Newest => "Newest",
            SortMode::Oldest => "Oldest",
            SortMode::MostLiked => "Most liked",
        }
    }

    pub fn all() -> &'static [SortMode] {
        &[SortMode::Newest, SortMode::Oldest, SortMode::MostLiked]
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" | "newest" => Ok(Self::Newest),
            "old" | "oldest" => Ok(Self::Oldest),
            "likes" | "most-liked" | "mostliked" => Ok(Self::MostLiked),
            other => Err(format!(
                "Unknown sort mode: {other} (expected new, old or likes)"
            )),
        }
    }
}
