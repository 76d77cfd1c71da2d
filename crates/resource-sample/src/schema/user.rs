use super::by_id;
use crate::model::{Admin, User, UserId};
use resource_framework::{FieldSpec, RelationshipSpec, Resource, ResourceDescriptor};
use serde_json::{json, Value};

/// `users`: members of the blog.
///
/// `email` is only shown to the user themselves (context key `viewer_id`).
pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::for_type::<User>()
        .attributes(["name", "email", "created_at"])
        .attribute_with(
            "email",
            FieldSpec::transform(|user, ctx| {
                let viewer = ctx.get("viewer_id").and_then(Value::as_str);
                if viewer == Some(user.resource_id().as_str()) {
                    user.property("email").unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }),
        )
        .meta_with(
            "profile_url",
            FieldSpec::transform(|user, ctx| {
                let base = ctx.get("base_url").and_then(Value::as_str).unwrap_or("");
                json!(format!("{base}/users/{}", user.resource_id()))
            }),
        )
        .relationship(
            RelationshipSpec::to_many("posts")
                .target("posts")
                .accessor(FieldSpec::transform(|user, ctx| {
                    by_id(user, ctx, |data, id: UserId| data.posts_by(id))
                })),
        )
        .relationship(
            RelationshipSpec::to_many("comments")
                .target("comments")
                .accessor(FieldSpec::transform(|user, ctx| {
                    by_id(user, ctx, |data, id: UserId| data.comments_by(id))
                })),
        )
        .sortable("name")
        .sortable("created_at")
}

/// `admins`: everything a user has, plus a role. Names carry an
/// `(admin)` suffix.
pub fn admin_descriptor(users: &ResourceDescriptor) -> ResourceDescriptor {
    ResourceDescriptor::inherit(users, "Admin")
        .attribute("role")
        .override_as::<Admin>("name", |admin, _| {
            json!(format!("{} (admin)", admin.user.name))
        })
        .sortable("role")
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::{Context, ResourceView};

    #[test]
    fn email_is_private() {
        let users = descriptor();
        let mut user = User::new("Alice", "alice@example.com");
        user.id = UserId(1);

        let anonymous = Context::new();
        let own = Context::new().with("viewer_id", "1");
        let attrs = ResourceView::new(&user, &users, &anonymous).attribute_values();
        assert_eq!(attrs["email"], Value::Null);
        let attrs = ResourceView::new(&user, &users, &own).attribute_values();
        assert_eq!(attrs["email"], json!("alice@example.com"));
    }

    #[test]
    fn admin_inherits_without_leaking_back() {
        let users = descriptor();
        let admins = admin_descriptor(&users);
        assert_eq!(admins.type_name(), "admins");
        assert_eq!(admins.attribute_names(), ["name", "email", "created_at", "role"]);
        assert_eq!(users.attribute_names(), ["name", "email", "created_at"]);
        assert!(admins.resolve_relationship("posts").is_some());
        assert!(!users.is_sortable("role"));

        let admin = Admin::new(User::new("Root", "root@example.com"), "owner");
        let ctx = Context::new();
        let attrs = ResourceView::new(&admin, &admins, &ctx).attribute_values();
        assert_eq!(attrs["name"], json!("Root (admin)"));
        assert_eq!(attrs["role"], json!("owner"));
    }
}
