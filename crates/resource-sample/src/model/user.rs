use super::UserId;
use chrono::{DateTime, Utc};
use resource_framework::{iso8601, Resource};
use serde::Deserialize;
use serde_json::{json, Value};

/// A registered member of the blog.
///
/// Rendered as `users`. Reached through polymorphic relationships it may
/// also turn out to be an [`Admin`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a new User instance.
    ///
    /// # Notes
    /// The `id` is a placeholder until the store assigns one.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId(0),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    fn user_property(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "email" => Some(json!(self.email)),
            "created_at" => Some(iso8601(&self.created_at)),
            _ => None,
        }
    }
}

impl Resource for User {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.user_property(name)
    }
}

/// A user with moderation rights, rendered as `admins`.
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub user: User,
    pub role: String,
}

impl Admin {
    pub fn new(user: User, role: impl Into<String>) -> Self {
        Self {
            user,
            role: role.into(),
        }
    }
}

impl Resource for Admin {
    fn resource_id(&self) -> String {
        self.user.id.to_string()
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "role" => Some(json!(self.role)),
            _ => self.user.user_property(name),
        }
    }
}
