//! # Framework Errors
//!
//! This module defines the error types raised by the resource framework.
//! Each engine owns one enum, and [`ResourceError`] unifies them for callers
//! that drive several engines from one request.

/// Errors raised while registering descriptors or computing a resource view.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A custom meta computation returned something other than a map.
    #[error("custom meta for `{type_name}` must return a map, got {found}")]
    MetaNotAMap {
        type_name: String,
        found: &'static str,
    },
    /// A type name is already registered with a different shape.
    #[error("type `{type_name}` is already registered with a different shape")]
    ConflictingDescriptor { type_name: String },
    /// Two wire types claim the same domain type.
    #[error(
        "domain type `{domain_type}` is already rendered as `{existing}`, \
         cannot also render as `{attempted}`"
    )]
    ConflictingDomainType {
        domain_type: String,
        existing: String,
        attempted: String,
    },
    /// No descriptor is registered under this type name.
    #[error("no descriptor registered for type `{0}`")]
    UnknownType(String),
}

/// Errors raised by the sort engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SortError {
    /// A directive names a field that is not sortable on the descriptor.
    #[error("cannot sort by `{field}`; sortable fields are [{}]", .legal.join(", "))]
    UnsupportedField { field: String, legal: Vec<String> },
    /// No custom transform was registered for the collection being sorted.
    #[error(
        "custom sort for `{field}` has no transform for `{found}`; it accepts [{}]",
        .expected.join(", ")
    )]
    CollectionMismatch {
        field: String,
        expected: Vec<&'static str>,
        found: &'static str,
    },
}

/// Errors raised by the optional strict include validator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncludeError {
    /// A path segment does not name a relationship of the resource it is applied to.
    #[error("`{segment}` is not a relationship of `{type_name}` (in include path `{path}`)")]
    UnknownRelationship {
        type_name: String,
        path: String,
        segment: String,
    },
    /// A path nests deeper than the configured limit.
    #[error("include path `{path}` has depth {depth}, the limit is {max}")]
    TooDeep {
        path: String,
        depth: usize,
        max: usize,
    },
}

/// Errors raised while loading engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Any error the framework can raise.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Include(#[from] IncludeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_field_lists_legal_fields() {
        let err = SortError::UnsupportedField {
            field: "createdAt".into(),
            legal: vec!["name".into(), "title".into()],
        };
        assert_eq!(
            err.to_string(),
            "cannot sort by `createdAt`; sortable fields are [name, title]"
        );
    }

    #[test]
    fn schema_error_converts_into_resource_error() {
        let err: ResourceError = SchemaError::UnknownType("widgets".into()).into();
        assert!(matches!(err, ResourceError::Schema(SchemaError::UnknownType(_))));
        assert_eq!(err.to_string(), "no descriptor registered for type `widgets`");
    }
}
