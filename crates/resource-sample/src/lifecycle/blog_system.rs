use crate::handlers::ApiHandler;
use crate::model::{
    CommentCreate, CommentId, PostCreate, PostId, TagCreate, TagId, UserCreate, UserId,
};
use crate::schema::build_registry;
use crate::store::{BlogStore, StoreError};
use chrono::{TimeZone, Utc};
use resource_framework::{
    EngineConfig, Registry, ResourceError, SerializationEngine, SortEngine,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Include paths deeper than this are rejected by the request layer.
pub const MAX_INCLUDE_DEPTH: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Descriptor registration or configuration failed.
    #[error(transparent)]
    Framework(#[from] ResourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Owns every long-lived component of the blog.
pub struct BlogSystem {
    pub store: Arc<BlogStore>,
    pub registry: Arc<Registry>,
    pub api: ApiHandler,
    config: EngineConfig,
}

/// Ids of the records created by [`BlogSystem::seed_demo`].
#[derive(Debug, Clone, Copy)]
pub struct DemoIds {
    pub alice: UserId,
    pub bob: UserId,
    pub root: UserId,
    pub rust: TagId,
    pub news: TagId,
    pub welcome: PostId,
    pub ownership: PostId,
    pub draft: PostId,
    pub great_read: CommentId,
    pub welcome_reply: CommentId,
    pub pinned: CommentId,
}

impl BlogSystem {
    pub fn new() -> Result<Self, SystemError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, SystemError> {
        let registry = Arc::new(build_registry().map_err(ResourceError::from)?);
        let store = Arc::new(BlogStore::new());
        let api = ApiHandler::new(
            store.clone(),
            SerializationEngine::new(registry.clone(), config.serializer.clone()),
            SortEngine::new(config.sort.clone()),
        )
        .with_max_include_depth(MAX_INCLUDE_DEPTH);
        info!(types = registry.len(), ?config, "Blog system ready");
        Ok(Self {
            store,
            registry,
            api,
            config,
        })
    }

    /// Loads engine options from a TOML file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SystemError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SystemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = EngineConfig::from_toml_str(&text).map_err(ResourceError::from)?;
        Self::with_config(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fills the store with a small blog: two members, one admin, two tags,
    /// three posts and three comments.
    pub async fn seed_demo(&self) -> Result<DemoIds, StoreError> {
        let store = &self.store;
        let alice = store
            .create_user(UserCreate {
                name: "Alice".into(),
                email: "alice@example.com".into(),
            })
            .await?;
        let bob = store
            .create_user(UserCreate {
                name: "Bob".into(),
                email: "bob@example.com".into(),
            })
            .await?;
        let root = store
            .create_admin(
                UserCreate {
                    name: "Root".into(),
                    email: "root@example.com".into(),
                },
                "owner",
            )
            .await?;

        let rust = store.create_tag(TagCreate { name: "rust".into() }).await?;
        let news = store
            .create_tag(TagCreate {
                name: "announcements".into(),
            })
            .await?;

        let welcome = store
            .create_post(PostCreate {
                author_id: root,
                title: "Hello, world".into(),
                content: "Welcome to the blog. Posts and comments live here.".into(),
                tag_ids: vec![news],
                published_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single(),
            })
            .await?;
        let ownership = store
            .create_post(PostCreate {
                author_id: alice,
                title: "Ownership in practice".into(),
                content: "Borrowing rules feel strict at first, then they start to feel like \
                          documentation the compiler checks for you."
                    .into(),
                tag_ids: vec![rust],
                published_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).single(),
            })
            .await?;
        let draft = store
            .create_post(PostCreate {
                author_id: bob,
                title: "Draft".into(),
                content: "TBD".into(),
                tag_ids: vec![],
                published_at: None,
            })
            .await?;

        let great_read = store
            .create_comment(CommentCreate {
                post_id: ownership,
                author_id: bob,
                body: "Great read!".into(),
                tag_ids: vec![rust],
            })
            .await?;
        let welcome_reply = store
            .create_comment(CommentCreate {
                post_id: welcome,
                author_id: alice,
                body: "Glad to be here.".into(),
                tag_ids: vec![],
            })
            .await?;
        let pinned = store
            .create_comment(CommentCreate {
                post_id: ownership,
                author_id: root,
                body: "Pinned.".into(),
                tag_ids: vec![],
            })
            .await?;

        store.record_views(ownership, 42).await?;
        store.record_views(welcome, 7).await?;
        info!("Demo data seeded");

        Ok(DemoIds {
            alice,
            bob,
            root,
            rust,
            news,
            welcome,
            ownership,
            draft,
            great_read,
            welcome_reply,
            pinned,
        })
    }
}
