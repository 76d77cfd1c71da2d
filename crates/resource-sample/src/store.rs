//! # Blog Store
//!
//! In-memory persistence for the blog. Writers build a new [`BlogData`]
//! snapshot and swap it in; readers take an `Arc<BlogData>` and keep a
//! consistent view for the whole request, including every relationship
//! lookup the serializer performs.
//!
//! [`SqlQuery`] is a small query builder implementing
//! [`Orderable`], used to show which `ORDER BY` a sort directive turns into.

use crate::model::{
    Admin, Comment, CommentCreate, CommentId, Post, PostCreate, PostId, Tag, TagCreate, TagId,
    User, UserCreate, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use resource_framework::{Orderable, Related, ResourceRef, SortDirection};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),
    #[error("`{0}` is not a valid id")]
    InvalidId(String),
    #[error("{kind} {id} does not exist")]
    MissingReference { kind: &'static str, id: u64 },
}

/// A user account: plain member or admin.
#[derive(Debug, Clone)]
pub enum Account {
    Member(Arc<User>),
    Admin(Arc<Admin>),
}

impl Account {
    pub fn user(&self) -> &User {
        match self {
            Account::Member(user) => user.as_ref(),
            Account::Admin(admin) => &admin.user,
        }
    }

    pub fn resource(&self) -> ResourceRef {
        match self {
            Account::Member(user) => user.clone() as ResourceRef,
            Account::Admin(admin) => admin.clone() as ResourceRef,
        }
    }
}

/// An immutable snapshot of every blog table.
#[derive(Debug, Clone, Default)]
pub struct BlogData {
    accounts: BTreeMap<UserId, Account>,
    posts: BTreeMap<PostId, Arc<Post>>,
    comments: BTreeMap<CommentId, Arc<Comment>>,
    tags: BTreeMap<TagId, Arc<Tag>>,
}

impl BlogData {
    pub fn account(&self, id: UserId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn post(&self, id: PostId) -> Option<&Arc<Post>> {
        self.posts.get(&id)
    }

    pub fn comment(&self, id: CommentId) -> Option<&Arc<Comment>> {
        self.comments.get(&id)
    }

    pub fn tag(&self, id: TagId) -> Option<&Arc<Tag>> {
        self.tags.get(&id)
    }

    // --- Relationship lookups ---

    pub fn author(&self, id: UserId) -> Related {
        self.account(id).map_or(Related::None, |a| Related::One(a.resource()))
    }

    pub fn posts_by(&self, author: UserId) -> Related {
        Related::many(
            self.posts
                .values()
                .filter(|p| p.author_id == author)
                .cloned(),
        )
    }

    pub fn comments_by(&self, author: UserId) -> Related {
        Related::many(
            self.comments
                .values()
                .filter(|c| c.author_id == author)
                .cloned(),
        )
    }

    pub fn comments_on(&self, post: PostId) -> Related {
        Related::many(
            self.comments
                .values()
                .filter(|c| c.post_id == post)
                .cloned(),
        )
    }

    pub fn comment_count(&self, post: PostId) -> usize {
        self.comments.values().filter(|c| c.post_id == post).count()
    }

    pub fn tags(&self, ids: &[TagId]) -> Related {
        Related::many(ids.iter().filter_map(|id| self.tags.get(id)).cloned())
    }

    /// Every post and comment carrying the tag, posts first.
    pub fn taggings(&self, tag: TagId) -> Related {
        let posts = self
            .posts
            .values()
            .filter(|p| p.tag_ids.contains(&tag))
            .map(|p| p.clone() as ResourceRef);
        let comments = self
            .comments
            .values()
            .filter(|c| c.tag_ids.contains(&tag))
            .map(|c| c.clone() as ResourceRef);
        Related::Many(posts.chain(comments).collect())
    }

    // --- Collections by wire type ---

    pub fn list(&self, type_name: &str) -> Result<Vec<ResourceRef>, StoreError> {
        let items = match type_name {
            "users" => self
                .accounts
                .values()
                .filter_map(|a| match a {
                    Account::Member(user) => Some(user.clone() as ResourceRef),
                    Account::Admin(_) => None,
                })
                .collect(),
            "admins" => self
                .accounts
                .values()
                .filter_map(|a| match a {
                    Account::Admin(admin) => Some(admin.clone() as ResourceRef),
                    Account::Member(_) => None,
                })
                .collect(),
            "posts" => self.posts.values().map(|p| p.clone() as ResourceRef).collect(),
            "comments" => self.comments.values().map(|c| c.clone() as ResourceRef).collect(),
            "tags" => self.tags.values().map(|t| t.clone() as ResourceRef).collect(),
            other => return Err(StoreError::UnknownCollection(other.to_string())),
        };
        Ok(items)
    }

    pub fn find(&self, type_name: &str, id: &str) -> Result<Option<ResourceRef>, StoreError> {
        let id: u64 = id.parse().map_err(|_| StoreError::InvalidId(id.to_string()))?;
        let found = match type_name {
            "users" | "admins" => self
                .account(UserId(id))
                .filter(|a| matches!(
                    (type_name, a),
                    ("users", Account::Member(_)) | ("admins", Account::Admin(_))
                ))
                .map(Account::resource),
            "posts" => self.post(PostId(id)).map(|p| p.clone() as ResourceRef),
            "comments" => self.comment(CommentId(id)).map(|c| c.clone() as ResourceRef),
            "tags" => self.tag(TagId(id)).map(|t| t.clone() as ResourceRef),
            other => return Err(StoreError::UnknownCollection(other.to_string())),
        };
        Ok(found)
    }

    fn next_id<K: Ord + Copy, V>(table: &BTreeMap<K, V>, raw: impl Fn(&K) -> u64) -> u64 {
        table.keys().next_back().map_or(1, |k| raw(k) + 1)
    }

    fn require_account(&self, id: UserId) -> Result<(), StoreError> {
        self.accounts
            .contains_key(&id)
            .then_some(())
            .ok_or(StoreError::MissingReference { kind: "user", id: id.0 })
    }

    fn require_tags(&self, ids: &[TagId]) -> Result<(), StoreError> {
        match ids.iter().find(|id| !self.tags.contains_key(*id)) {
            Some(missing) => Err(StoreError::MissingReference {
                kind: "tag",
                id: missing.0,
            }),
            None => Ok(()),
        }
    }
}

/// Read access to blog collections.
#[async_trait]
pub trait Repository: Send + Sync {
    /// A consistent snapshot for one request.
    async fn snapshot(&self) -> Arc<BlogData>;

    async fn list(&self, type_name: &str) -> Result<Vec<ResourceRef>, StoreError> {
        self.snapshot().await.list(type_name)
    }

    async fn find(&self, type_name: &str, id: &str) -> Result<Option<ResourceRef>, StoreError> {
        self.snapshot().await.find(type_name, id)
    }
}

/// The blog's tables behind an async lock, copied on write.
#[derive(Debug, Default)]
pub struct BlogStore {
    data: RwLock<Arc<BlogData>>,
}

impl BlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn write<T>(
        &self,
        f: impl FnOnce(&mut BlogData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.data.write().await;
        let mut next = BlogData::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    pub async fn create_user(&self, params: UserCreate) -> Result<UserId, StoreError> {
        let id = self
            .write(|data| {
                let id = UserId(BlogData::next_id(&data.accounts, |k| k.0));
                let mut user = User::new(params.name, params.email);
                user.id = id;
                data.accounts.insert(id, Account::Member(Arc::new(user)));
                Ok(id)
            })
            .await?;
        info!(user_id = %id, "Created user");
        Ok(id)
    }

    pub async fn create_admin(
        &self,
        params: UserCreate,
        role: impl Into<String>,
    ) -> Result<UserId, StoreError> {
        let role = role.into();
        let id = self
            .write(|data| {
                let id = UserId(BlogData::next_id(&data.accounts, |k| k.0));
                let mut user = User::new(params.name, params.email);
                user.id = id;
                data.accounts
                    .insert(id, Account::Admin(Arc::new(Admin::new(user, role))));
                Ok(id)
            })
            .await?;
        info!(user_id = %id, "Created admin");
        Ok(id)
    }

    pub async fn create_tag(&self, params: TagCreate) -> Result<TagId, StoreError> {
        let id = self
            .write(|data| {
                let id = TagId(BlogData::next_id(&data.tags, |k| k.0));
                data.tags.insert(
                    id,
                    Arc::new(Tag {
                        id,
                        name: params.name,
                    }),
                );
                Ok(id)
            })
            .await?;
        info!(tag_id = %id, "Created tag");
        Ok(id)
    }

    pub async fn create_post(&self, params: PostCreate) -> Result<PostId, StoreError> {
        let id = self
            .write(|data| {
                data.require_account(params.author_id)?;
                data.require_tags(&params.tag_ids)?;
                let id = PostId(BlogData::next_id(&data.posts, |k| k.0));
                data.posts.insert(
                    id,
                    Arc::new(Post {
                        id,
                        author_id: params.author_id,
                        title: params.title,
                        content: params.content,
                        tag_ids: params.tag_ids,
                        published_at: params.published_at,
                        view_count: 0,
                    }),
                );
                Ok(id)
            })
            .await?;
        info!(post_id = %id, "Created post");
        Ok(id)
    }

    pub async fn create_comment(&self, params: CommentCreate) -> Result<CommentId, StoreError> {
        let id = self
            .write(|data| {
                if !data.posts.contains_key(&params.post_id) {
                    return Err(StoreError::MissingReference {
                        kind: "post",
                        id: params.post_id.0,
                    });
                }
                data.require_account(params.author_id)?;
                data.require_tags(&params.tag_ids)?;
                let id = CommentId(BlogData::next_id(&data.comments, |k| k.0));
                data.comments.insert(
                    id,
                    Arc::new(Comment {
                        id,
                        post_id: params.post_id,
                        author_id: params.author_id,
                        body: params.body,
                        tag_ids: params.tag_ids,
                        created_at: Utc::now(),
                    }),
                );
                Ok(id)
            })
            .await?;
        info!(comment_id = %id, "Created comment");
        Ok(id)
    }

    /// Records `count` more views of a post.
    pub async fn record_views(&self, post: PostId, count: u64) -> Result<u64, StoreError> {
        self.write(|data| {
            let existing = data.posts.get(&post).ok_or(StoreError::MissingReference {
                kind: "post",
                id: post.0,
            })?;
            let mut updated = Post::clone(existing);
            updated.view_count += count;
            let total = updated.view_count;
            data.posts.insert(post, Arc::new(updated));
            debug!(post_id = %post, total, "Recorded views");
            Ok(total)
        })
        .await
    }
}

#[async_trait]
impl Repository for BlogStore {
    async fn snapshot(&self) -> Arc<BlogData> {
        Arc::clone(&*self.data.read().await)
    }
}

/// A `SELECT` over one table, ordered by chained `ORDER BY` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    table: String,
    joins: Vec<String>,
    order: Vec<String>,
}

impl SqlQuery {
    pub fn select(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            joins: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn join(&mut self, table: &str, on: &str) -> &mut Self {
        let clause = format!("JOIN {table} ON {on}");
        if !self.joins.contains(&clause) {
            self.joins.push(clause);
        }
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Orderable for SqlQuery {
    fn order_by(&mut self, column: &str, direction: SortDirection) {
        let direction = match direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        self.order.push(format!("{column} {direction}"));
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {}.* FROM {}", self.table, self.table)?;
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        if !self.order.is_empty() {
            write!(f, " ORDER BY {}", self.order.join(", "))?;
        }
        Ok(())
    }
}
