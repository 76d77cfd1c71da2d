use super::with_data;
use crate::model::Post;
use crate::store::{BlogData, SqlQuery};
use resource_framework::{
    FieldSpec, Orderable, RelationshipSpec, ResourceDescriptor, ResourceList, SortStrategy,
};
use serde_json::json;

const EXCERPT_CHARS: usize = 40;

/// Whitespace-separated word count as a SQL expression over `content`.
const WORD_COUNT_SQL: &str =
    "LENGTH(TRIM(content)) - LENGTH(REPLACE(TRIM(content), ' ', '')) + 1";

/// `posts`.
///
/// `author` has no declared target: admins render as `admins`, members as
/// `users`. Sorting by `created_at` orders by the publication timestamp.
/// `word_count` and `author_name` are computed sorts with an in-memory and a
/// SQL rendition each.
pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::for_type::<Post>()
        .attributes(["title", "content", "published_at"])
        .attribute_with(
            "excerpt",
            FieldSpec::transform_as::<Post>(|post, _| json!(excerpt(&post.content))),
        )
        .meta("view_count")
        .custom_meta(|view| {
            let Some(post) = view.object().downcast_ref::<Post>() else {
                return json!({});
            };
            let comment_count = view
                .context()
                .extension::<BlogData>()
                .map(|data| data.comment_count(post.id));
            json!({"word_count": post.word_count(), "comment_count": comment_count})
        })
        .relationship(RelationshipSpec::to_one("author").accessor(
            FieldSpec::transform_as::<Post>(|post, ctx| {
                with_data(ctx, |data| data.author(post.author_id))
            }),
        ))
        .relationship(
            RelationshipSpec::to_many("comments")
                .target("comments")
                .accessor(FieldSpec::transform_as::<Post>(|post, ctx| {
                    with_data(ctx, |data| data.comments_on(post.id))
                })),
        )
        .relationship(
            RelationshipSpec::to_many("tags")
                .target("tags")
                .accessor(FieldSpec::transform_as::<Post>(|post, ctx| {
                    with_data(ctx, |data| data.tags(&post.tag_ids))
                })),
        )
        .sortable("title")
        .sortable("view_count")
        .sortable_by("created_at", SortStrategy::aliased("published_at"))
        .sortable_by(
            "word_count",
            SortStrategy::custom::<ResourceList>(|list, direction| {
                list.order_by_key(
                    |object, _| json!(object.downcast_ref::<Post>().map_or(0, Post::word_count)),
                    direction,
                );
            })
            .or_custom::<SqlQuery>(|query, direction| {
                query.order_by(WORD_COUNT_SQL, direction);
            }),
        )
        .sortable_by(
            "author_name",
            SortStrategy::custom::<ResourceList>(|list, direction| {
                list.order_by_key(
                    |object, ctx| {
                        let name = object.downcast_ref::<Post>().and_then(|post| {
                            let account = ctx.extension::<BlogData>()?.account(post.author_id)?;
                            Some(account.user().name.clone())
                        });
                        json!(name)
                    },
                    direction,
                );
            })
            .or_custom::<SqlQuery>(|query, direction| {
                let on = format!("users.id = {}.author_id", query.table());
                query.join("users", &on).order_by("users.name", direction);
            }),
        )
}

fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", content[..cut].trim_end()),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_cuts_on_char_boundaries() {
        assert_eq!(excerpt("short"), "short");
        let long = "é".repeat(50);
        assert_eq!(excerpt(&long), format!("{}...", "é".repeat(40)));
    }
}
