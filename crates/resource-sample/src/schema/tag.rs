use super::with_data;
use crate::model::Tag;
use resource_framework::{FieldSpec, RelationshipSpec, ResourceDescriptor};

/// `tags`. `taggings` mixes posts and comments, each rendered under its own type.
pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::for_type::<Tag>()
        .attribute("name")
        .relationship(RelationshipSpec::to_many("taggings").accessor(
            FieldSpec::transform_as::<Tag>(|tag, ctx| with_data(ctx, |data| data.taggings(tag.id))),
        ))
        .sortable("name")
}
