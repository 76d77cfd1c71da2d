//! # Observability & Tracing
//!
//! The engines emit structured `tracing` events; this module installs a
//! subscriber for binaries and demos.
//!
//! ## What Gets Traced
//!
//! | Level   | Event                                                        |
//! |---------|--------------------------------------------------------------|
//! | `debug` | Descriptor registered, serialize started/finished, sort term applied |
//! | `trace` | Each included node, each skipped (unresolvable or already seen) node |
//! | `warn`  | Sort field rejected, custom meta that is not a map           |
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run                          # Request-level logs only
//! RUST_LOG=resource_framework=debug cargo run      # Engine decisions
//! RUST_LOG=resource_framework::include=trace cargo run  # Every node of the include walk
//! ```
//!
//! With `RUST_LOG=trace` a request for `include=author,author.comments` reads:
//!
//! ```text
//! DEBUG Serializing type_name="posts" roots=1 includes=["author", "author.comments"]
//! TRACE Included type_name=users id=1 via="author"
//! TRACE Included type_name=comments id=3 via="comments"
//! TRACE Already included type_name=comments id=3
//! DEBUG Serialized type_name="posts" included=2
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Calling it again after a subscriber is installed does nothing.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
