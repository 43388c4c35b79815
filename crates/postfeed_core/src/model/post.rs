//! Post record returned by the remote posts endpoint.

use serde::{Deserialize, Serialize};

/// Numeric identifier assigned by the remote source.
pub type PostId = i64;

/// One post as delivered by the remote API.
///
/// The core never mutates a post; a refresh replaces the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    /// Author reference sent by the endpoint as `userId`. Not used by core
    /// logic; kept so hosts can render it.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl Post {
    /// Creates a post without author metadata.
    pub fn new(id: PostId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            user_id: None,
        }
    }
}
