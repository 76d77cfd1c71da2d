//! # Resource Recipe Blog
//!
//! A worked example of schema-driven resource serialization.
//!
//! ## Core Components
//!
//! - **[schema]**: One descriptor per resource type, registered once at startup.
//! - **[model]**: Pure domain types ([`Post`](model::Post), [`User`](model::User), ...)
//!   implementing `Resource`.
//! - **[store]**: Snapshot-based in-memory persistence.
//! - **[handlers]**: Query parsing, sorting and serialization per request.
//! - **[lifecycle]**: Wires everything together.
//!
//! ## Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p resource-sample
//! BLOG_CONFIG=blog.toml RUST_LOG=resource_framework=trace cargo run -p resource-sample
//! ```

use resource_framework::tracing::setup_tracing;
use resource_sample::handlers::ApiQuery;
use resource_sample::lifecycle::BlogSystem;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting blog demo");

    let system = match std::env::var("BLOG_CONFIG") {
        Ok(path) => BlogSystem::from_config_file(path),
        Err(_) => BlogSystem::new(),
    }
    .map_err(|e| e.to_string())?;

    let ids = system
        .seed_demo()
        .instrument(tracing::info_span!("seeding"))
        .await
        .map_err(|e| e.to_string())?;

    let requests = [
        ("posts", Some(ids.ownership.to_string()), "include=author,comments,comments.author"),
        ("posts", None, "sort=-created_at,title&include=tags"),
        ("posts", None, "sort=author_name"),
        ("tags", Some(ids.rust.to_string()), "include=taggings"),
        ("users", None, "sort=nickname"),
    ];

    for (type_name, id, raw_query) in requests {
        let span = tracing::info_span!("request", type_name, query = raw_query);
        let result = async {
            let query = ApiQuery::parse(raw_query)?;
            match &id {
                Some(id) => system.api.show(type_name, id, &query).await,
                None => system.api.index(type_name, &query).await,
            }
        }
        .instrument(span)
        .await;

        match result.map(|doc| doc.to_json_pretty()) {
            Ok(Ok(json)) => println!("GET /{type_name} ?{raw_query}\n{json}\n"),
            Ok(Err(e)) => error!(error = %e, "Encoding failed"),
            Err(e) => error!(status = e.status(), error = %e, "Request failed"),
        }
    }

    for raw_query in ["sort=-created_at,title", "sort=author_name,-word_count"] {
        let query = ApiQuery::parse(raw_query).map_err(|e| e.to_string())?;
        match system.api.explain("posts", &query) {
            Ok(sql) => info!(%sql, "Index query"),
            Err(e) => error!(error = %e, "Explain failed"),
        }
    }

    info!("Demo completed");
    Ok(())
}
