//! Blog domain types implementing the [`Resource`](resource_framework::Resource) trait.
//!
//! Models hold foreign keys, not object references. Relationship accessors in
//! [`schema`](crate::schema) resolve them against a [`BlogData`](crate::store::BlogData)
//! snapshot carried in the request context.

pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

pub use comment::*;
pub use post::*;
pub use tag::*;
pub use user::*;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map($name)
            }
        }
    };
}

id_type!(
    /// Identifies a user account, member or admin.
    UserId
);
id_type!(PostId);
id_type!(CommentId);
id_type!(TagId);
