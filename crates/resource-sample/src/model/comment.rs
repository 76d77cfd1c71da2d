use super::{CommentId, PostId, TagId, UserId};
use chrono::{DateTime, Utc};
use resource_framework::{iso8601, Resource};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub tag_ids: Vec<TagId>,
    pub created_at: DateTime<Utc>,
}

/// Payload for commenting on a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentCreate {
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl Resource for Comment {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "body" => Some(json!(self.body)),
            "created_at" => Some(iso8601(&self.created_at)),
            _ => None,
        }
    }
}
