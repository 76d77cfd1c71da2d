use super::{PostId, TagId, UserId};
use chrono::{DateTime, Utc};
use resource_framework::{iso8601, Resource};
use serde::Deserialize;
use serde_json::{json, Value};

/// A blog post written by a user or an admin.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<TagId>,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
}

/// Payload for creating a new post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostCreate {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

impl Resource for Post {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(json!(self.title)),
            "content" => Some(json!(self.content)),
            "published_at" => Some(self.published_at.as_ref().map_or(Value::Null, iso8601)),
            "view_count" => Some(json!(self.view_count)),
            _ => None,
        }
    }
}
