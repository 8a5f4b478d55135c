use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Broadcast topic carrying [`PostUpdated`] payloads.
pub const POST_UPDATED: &str = "post:updated";

/// Author sub-record embedded in a post.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Reference to an uploaded file, as returned by the upload endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A post as stored by the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

impl Post {
    /// Overwrite the fields present in `patch`, keeping everything else.
    pub fn merge(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(author) = &patch.author {
            self.author = Some(author.clone());
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = Some(created_at);
        }
        if let Some(likes) = patch.likes_count {
            self.likes_count = likes;
        }
        if let Some(attachments) = &patch.attachments {
            self.attachments = attachments.clone();
        }
    }
}

/// Partial post record. Absent fields leave the target untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

/// Payload of a `post:updated` broadcast. Both parts are optional on the wire;
/// receivers ignore payloads missing either one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct PostUpdated {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub post: Option<PostPatch>,
}

/// Body sent to create a post.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Result of toggling a like.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: u64,
}

/// Result of a multi-file upload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub files: Vec<Attachment>,
}

/// Server responses come either bare or wrapped in `{"data": ...}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn likes_default_to_zero() {
        let missing: Post = serde_json::from_value(json!({"_id": "p1", "title": "T"})).unwrap();
        assert_eq!(missing.likes_count, 0);
        assert!(missing.attachments.is_empty());
        let null: Post =
            serde_json::from_value(json!({"_id": "p2", "likesCount": null})).unwrap();
        assert_eq!(null.likes_count, 0);
    }

    #[test]
    fn null_text_fields_do_not_reject_the_feed() {
        let feed: Envelope<Vec<Post>> = serde_json::from_value(json!([
            {"_id": "ok", "title": "Fine", "content": "text", "author": {"name": "Ada"}},
            {"_id": "p1", "title": null, "content": null, "author": {"name": null}, "attachments": null}
        ]))
        .unwrap();
        let posts = feed.into_inner();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].content, "text");
        assert_eq!(posts[1].title, "");
        assert_eq!(posts[1].content, "");
        assert_eq!(posts[1].author.as_ref().map(|a| a.name.as_str()), Some(""));
        assert!(posts[1].attachments.is_empty());
    }

    #[test]
    fn post_wire_names() {
        let post: Post = serde_json::from_value(json!({
            "_id": "p1",
            "title": "Hello",
            "content": "Body",
            "author": {"name": "Ada", "avatarUrl": "https://cdn/a.png"},
            "createdAt": "2024-03-01T10:00:00.000Z",
            "likesCount": 3,
            "attachments": [{"url": "/uploads/a.png", "mimeType": "image/png"}]
        }))
        .unwrap();
        assert_eq!(post.id, "p1");
        assert_eq!(
            post.author.as_ref().and_then(|a| a.avatar_url.as_deref()),
            Some("https://cdn/a.png")
        );
        assert_eq!(post.created_at.map(|t| t.year()), Some(2024));
        assert_eq!(post.attachments[0].mime_type.as_deref(), Some("image/png"));
        let back = serde_json::to_value(&post).unwrap();
        assert_eq!(back["_id"], "p1");
        assert_eq!(back["likesCount"], 3);
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut post: Post = serde_json::from_value(json!({
            "_id": "p1", "title": "T", "content": "C", "likesCount": 1
        }))
        .unwrap();
        let patch: PostPatch = serde_json::from_value(json!({"likesCount": 9})).unwrap();
        post.merge(&patch);
        assert_eq!(post.likes_count, 9);
        assert_eq!(post.title, "T");
        assert_eq!(post.content, "C");
    }

    #[test]
    fn update_payload_parts_optional() {
        let empty: PostUpdated = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, PostUpdated::default());
        let no_post: PostUpdated = serde_json::from_value(json!({"id": "p1"})).unwrap();
        assert!(no_post.post.is_none());
    }

    #[test]
    fn envelope_accepts_both_shapes() {
        let wrapped: Envelope<LikeResponse> =
            serde_json::from_value(json!({"data": {"likesCount": 5}})).unwrap();
        assert_eq!(wrapped.into_inner().likes_count, 5);
        let bare: Envelope<LikeResponse> =
            serde_json::from_value(json!({"likesCount": 4})).unwrap();
        assert_eq!(bare.into_inner().likes_count, 4);
        let list: Envelope<Vec<Post>> =
            serde_json::from_value(json!([{"_id": "a"}, {"_id": "b"}])).unwrap();
        assert_eq!(list.into_inner().len(), 2);
    }
}
