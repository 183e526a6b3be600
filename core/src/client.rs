//! Stateless HTTP request builder and response parser for the posts API.
//!
//! # Design
//! `PostsClient` holds only its `ClientConfig` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the round-trip in between.
//!
//! Every failed parse is logged with the operation name before the error is
//! handed back; there is no retry and no backoff.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewPost, Post, PostPatch};

#[derive(Debug, Clone)]
pub struct PostsClient {
    base_url: String,
    config: ClientConfig,
}

impl PostsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_list_posts(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/posts", self.base_url), None)
    }

    pub fn build_create_post(&self, input: &NewPost) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, format!("{}/posts", self.base_url), Some(body)))
    }

    pub fn build_update_post(&self, id: u64, input: &PostPatch) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(HttpMethod::Put, format!("{}/posts/{id}", self.base_url), Some(body)))
    }

    pub fn build_delete_post(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{}/posts/{id}", self.base_url), None)
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        decode(&response).map_err(|e| fail("fetching posts", e))
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        decode(&response).map_err(|e| fail("creating post", e))
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        decode(&response).map_err(|e| fail("updating post", e))
    }

    /// The response body is ignored; some servers answer `{}`, others nothing.
    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response).map_err(|e| fail("deleting post", e))
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let headers = match body {
            Some(_) => vec![("content-type".to_string(), "application/json".to_string())],
            None => Vec::new(),
        };
        HttpRequest {
            method,
            path,
            headers,
            body,
            timeout: self.config.timeout,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn fail(operation: &'static str, err: ApiError) -> ApiError {
    tracing::error!(error = %err, "error {operation}");
    err
}
