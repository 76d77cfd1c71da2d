use super::with_data;
use crate::model::Comment;
use resource_framework::{FieldSpec, Related, RelationshipSpec, ResourceDescriptor};

/// `comments`. The author is always rendered as `users`, admins included.
pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::for_type::<Comment>()
        .attributes(["body", "created_at"])
        .relationship(
            RelationshipSpec::to_one("author")
                .target("users")
                .accessor(FieldSpec::transform_as::<Comment>(|comment, ctx| {
                    with_data(ctx, |data| data.author(comment.author_id))
                })),
        )
        .relationship(
            RelationshipSpec::to_one("post")
                .target("posts")
                .accessor(FieldSpec::transform_as::<Comment>(|comment, ctx| {
                    with_data(ctx, |data| Related::optional(data.post(comment.post_id).cloned()))
                })),
        )
        .relationship(
            RelationshipSpec::to_many("tags")
                .target("tags")
                .accessor(FieldSpec::transform_as::<Comment>(|comment, ctx| {
                    with_data(ctx, |data| data.tags(&comment.tag_ids))
                })),
        )
        .sortable("created_at")
}
