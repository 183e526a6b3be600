//! Domain DTOs for the posts API.
//!
//! # Design
//! These types mirror the remote schema (`userId`, `id`, `title`, `body`) but
//! are defined independently from the mock-server crate. Integration tests
//! catch any schema drift between the two.

use serde::{Deserialize, Serialize};

/// A single post returned by the API. `id` is assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// Request payload for creating a post. The server assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Request payload for updating an existing post. Only the fields present in
/// the JSON are sent; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_uses_wire_field_names() {
        let post = Post {
            user_id: 1,
            id: 7,
            title: "A".to_string(),
            body: "b".to_string(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["userId"], 1);
        assert_eq!(json["id"], 7);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = PostPatch {
            title: Some("Z".to_string()),
            ..PostPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "Z" }));
    }

    #[test]
    fn post_rejects_missing_title() {
        let result: Result<Post, _> = serde_json::from_str(r#"{"userId":1,"id":1,"body":"b"}"#);
        assert!(result.is_err());
    }
}
