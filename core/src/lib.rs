//! Headless core of the posts client.
//!
//! # Overview
//! Lists, creates, updates and deletes posts against a `/posts` collection
//! endpoint. The core never touches the network (host-does-IO pattern): it
//! hands `Dispatch` values to the host and consumes the host's replies, which
//! keeps every state transition deterministic and testable.
//!
//! # Design
//! - `PostsClient` is stateless: `build_*` produces a request, `parse_*`
//!   consumes a response.
//! - `PostsScreen` implements the list/create/edit/update/delete flow once,
//!   parameterized by a `PostSource`: `ManualSource` keeps its own list,
//!   `CachedSource` reads through the shared `QueryCache`.
//! - `App` owns the single `AppContext` and the two tabs, and routes replies
//!   back to the tab that issued each request.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mutation;
pub mod screen;
pub mod shell;
pub mod source;
pub mod types;

pub use cache::{QueryCache, QueryKey, QueryOptions, QueryState};
pub use client::PostsClient;
pub use config::ClientConfig;
pub use context::AppContext;
pub use dispatch::{Dispatch, Operation, Reply, RequestId};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::{Mutation, MutationStatus};
pub use screen::{Completion, Draft, EditForm, Outcome, PostsScreen, Rejected, ScreenView};
pub use shell::{App, Tab};
pub use source::{CachedSource, ListState, ManualSource, PostSource};
pub use types::{NewPost, Post, PostPatch};
