//! # Request Handlers
//!
//! The request layer in front of the engines. For each request it:
//!
//! 1. Parses the raw query string into an [`ApiQuery`] (`include=` and `sort=`).
//! 2. Rejects include paths that name unknown relationships or nest too deep.
//!    The serializer itself would silently ignore them.
//! 3. Takes one [`BlogData`] snapshot and places it in the request context.
//! 4. Fetches, sorts and serializes.
//!
//! Every failure surfaces as an [`ApiError`] with an HTTP-style status code.

use crate::store::{BlogData, Repository, SqlQuery, StoreError};
use resource_framework::include::{self, IncludeTree};
use resource_framework::{
    Context, Document, IncludeError, Registry, ResourceDescriptor, ResourceList, SchemaError,
    SerializationEngine, SortEngine, SortError,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{type_name} {id} not found")]
    NotFound { type_name: String, id: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Include(#[from] IncludeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound { .. } => 404,
            ApiError::Sort(SortError::CollectionMismatch { .. }) => 500,
            ApiError::BadRequest(_) | ApiError::Sort(_) | ApiError::Include(_) => 400,
            ApiError::Schema(SchemaError::UnknownType(_)) => 404,
            ApiError::Schema(_) => 500,
            ApiError::Store(StoreError::UnknownCollection(_)) => 404,
            ApiError::Store(StoreError::InvalidId(_)) => 400,
            ApiError::Store(StoreError::MissingReference { .. }) => 422,
        }
    }
}

/// Query parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiQuery {
    pub include: Vec<String>,
    pub sort: Option<String>,
    /// Id of the user making the request, if authenticated.
    pub viewer: Option<String>,
}

impl ApiQuery {
    /// Parses `include=author,comments&sort=-created_at`. Unknown or repeated
    /// parameters are rejected.
    pub fn parse(query: &str) -> Result<Self, ApiError> {
        let mut parsed = ApiQuery::default();
        let mut seen_include = false;
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "include" if !seen_include => {
                    seen_include = true;
                    parsed.include = value
                        .split(',')
                        .map(str::trim)
                        .filter(|path| !path.is_empty())
                        .map(String::from)
                        .collect();
                }
                "sort" if parsed.sort.is_none() => parsed.sort = Some(value.to_string()),
                "include" | "sort" => {
                    return Err(ApiError::BadRequest(format!("`{key}` given more than once")))
                }
                other => {
                    return Err(ApiError::BadRequest(format!("unknown query parameter `{other}`")))
                }
            }
        }
        Ok(parsed)
    }

    pub fn as_viewer(mut self, user_id: impl Into<String>) -> Self {
        self.viewer = Some(user_id.into());
        self
    }
}

/// Serves `show`, `index` and `explain` requests for every registered type.
pub struct ApiHandler {
    repository: Arc<dyn Repository>,
    serializer: SerializationEngine,
    sorter: SortEngine,
    max_include_depth: Option<usize>,
    base_url: String,
}

impl ApiHandler {
    pub fn new(
        repository: Arc<dyn Repository>,
        serializer: SerializationEngine,
        sorter: SortEngine,
    ) -> Self {
        Self {
            repository,
            serializer,
            sorter,
            max_include_depth: None,
            base_url: String::new(),
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = Some(depth);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn registry(&self) -> &Registry {
        self.serializer.registry()
    }

    fn descriptor(
        &self,
        type_name: &str,
        query: &ApiQuery,
    ) -> Result<Arc<ResourceDescriptor>, ApiError> {
        let descriptor = Arc::clone(self.registry().require(type_name)?);
        let tree = IncludeTree::parse(&query.include);
        include::validate(self.registry(), &descriptor, &tree, self.max_include_depth).inspect_err(
            |err| warn!(type_name, error = %err, "Rejected include"),
        )?;
        Ok(descriptor)
    }

    fn context(&self, data: Arc<BlogData>, query: &ApiQuery) -> Context {
        let mut ctx = Context::new()
            .with("base_url", self.base_url.as_str())
            .with_extension(data);
        if let Some(viewer) = &query.viewer {
            ctx.insert("viewer_id", viewer.as_str());
        }
        ctx
    }

    #[instrument(skip(self))]
    pub async fn show(
        &self,
        type_name: &str,
        id: &str,
        query: &ApiQuery,
    ) -> Result<Document, ApiError> {
        debug!("Handling request");
        let descriptor = self.descriptor(type_name, query)?;
        let data = self.repository.snapshot().await;
        let object = data.find(type_name, id)?.ok_or_else(|| ApiError::NotFound {
            type_name: type_name.to_string(),
            id: id.to_string(),
        })?;

        let ctx = self.context(data, query);
        let doc = self.serializer.serialize(&descriptor, object, &ctx, &query.include)?;
        info!(included = doc.included().len(), "Served");
        Ok(doc)
    }

    #[instrument(skip(self))]
    pub async fn index(&self, type_name: &str, query: &ApiQuery) -> Result<Document, ApiError> {
        debug!("Handling request");
        let descriptor = self.descriptor(type_name, query)?;
        let data = self.repository.snapshot().await;
        let items = data.list(type_name)?;
        let ctx = self.context(data, query);
        let mut list = ResourceList::new(items).with_context(ctx.clone());
        if let Some(sort) = &query.sort {
            let directive = self.sorter.parse(sort);
            self.sorter.apply(&mut list, &directive, &descriptor)?;
        }

        let doc = self
            .serializer
            .serialize(&descriptor, list.into_items(), &ctx, &query.include)?;
        info!(
            count = doc.data.objects().len(),
            included = doc.included().len(),
            "Served"
        );
        Ok(doc)
    }

    /// The SQL a database-backed store would run for an index request.
    #[instrument(skip(self))]
    pub fn explain(&self, type_name: &str, query: &ApiQuery) -> Result<String, ApiError> {
        let descriptor = self.descriptor(type_name, query)?;
        let mut sql = SqlQuery::select(descriptor.type_name());
        if let Some(sort) = &query.sort {
            self.sorter
                .apply(&mut sql, &self.sorter.parse(sort), &descriptor)?;
        }
        Ok(sql.to_string())
    }
}
