//! A screen that lists, creates, edits, updates and deletes posts.
//!
//! # Design
//! `PostsScreen` owns the form state, the three mutation wrappers and the
//! table of requests it has handed to the host. Everything about the list
//! itself is delegated to its `PostSource`, so the manual screen and the
//! cache-backed screen share this one implementation.
//!
//! Handlers never block. Submitting returns a `Dispatch` for the host to
//! execute; the host later calls `complete` with the same `RequestId`.
//! Completions are applied in arrival order, whether or not the screen is
//! still visible.

use std::collections::HashMap;

use crate::context::AppContext;
use crate::dispatch::{Dispatch, Operation, Reply, RequestId};
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::mutation::Mutation;
use crate::source::{Applied, FormReset, ListState, PostSource};
use crate::types::{NewPost, Post, PostPatch};

/// Author id attached to every post created from a screen.
pub const DEFAULT_USER_ID: u64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
}

impl Draft {
    fn clear(&mut self) {
        self.title.clear();
        self.body.clear();
    }
}

/// The post under edit and the edited field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Why a submission did not produce a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("no post is being edited")]
    NotEditing,
    #[error("{0} is already in flight")]
    InFlight(Operation),
    #[error("post {0} is not in the list")]
    UnknownPost(u64),
    #[error("request body could not be encoded: {0}")]
    Encoding(String),
}

/// Result of a settled write, surfaced so a host can render feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(Post),
    Updated(Post),
    Deleted(u64),
    Failed { operation: Operation, error: ApiError },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// What applying a completion produced.
#[derive(Debug, Default)]
pub struct Completion {
    /// Set for mutations, `None` for list fetches.
    pub outcome: Option<Outcome>,
    /// Follow-up requests, e.g. a refetch after a confirmed write.
    pub dispatches: Vec<Dispatch>,
}

/// Render model of a screen.
#[derive(Debug)]
pub struct ScreenView<'a> {
    pub title: &'a str,
    pub draft: &'a Draft,
    pub editing: Option<&'a EditForm>,
    pub list: ListState<'a>,
    pub creating: bool,
    pub last_outcome: Option<&'a Outcome>,
}

#[derive(Debug)]
pub struct PostsScreen<S> {
    title: &'static str,
    source: S,
    mounted: bool,
    draft: Draft,
    editing: Option<EditForm>,
    creates: Mutation<()>,
    updates: Mutation<u64>,
    deletes: Mutation<u64>,
    pending: HashMap<RequestId, Operation>,
    last_outcome: Option<Outcome>,
}

impl<S: PostSource> PostsScreen<S> {
    pub fn new(title: &'static str, source: S) -> Self {
        Self {
            title,
            source,
            mounted: false,
            draft: Draft::default(),
            editing: None,
            creates: Mutation::new(),
            updates: Mutation::new(),
            deletes: Mutation::new(),
            pending: HashMap::new(),
            last_outcome: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn editing(&self) -> Option<&EditForm> {
        self.editing.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    /// Requests handed out and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn mount(&mut self, cx: &mut AppContext) -> Vec<Dispatch> {
        self.mounted = true;
        let dispatch = self.source.mount(cx);
        self.track(dispatch)
    }

    pub fn focus(&mut self, cx: &mut AppContext) -> Vec<Dispatch> {
        let dispatch = self.source.focus(cx);
        self.track(dispatch)
    }

    pub fn blur(&mut self, cx: &mut AppContext) {
        self.source.blur(cx);
    }

    pub fn unmount(&mut self, cx: &mut AppContext) {
        if self.mounted {
            self.source.unmount(cx);
            self.mounted = false;
        }
    }

    pub fn set_draft_title(&mut self, title: &str) {
        self.draft.title = title.to_string();
    }

    pub fn set_draft_body(&mut self, body: &str) {
        self.draft.body = body.to_string();
    }

    /// Ignored when nothing is under edit.
    pub fn set_edit_title(&mut self, title: &str) {
        if let Some(form) = &mut self.editing {
            form.title = title.to_string();
        }
    }

    /// Ignored when nothing is under edit.
    pub fn set_edit_body(&mut self, body: &str) {
        if let Some(form) = &mut self.editing {
            form.body = body.to_string();
        }
    }

    /// Copy post `id` into the edit form. Nothing is locked remotely.
    pub fn begin_edit(&mut self, cx: &AppContext, id: u64) -> Result<(), Rejected> {
        let post = self
            .source
            .list(cx)
            .posts()
            .iter()
            .find(|p| p.id == id)
            .ok_or(Rejected::UnknownPost(id))?;
        self.editing = Some(EditForm {
            id: post.id,
            user_id: post.user_id,
            title: post.title.clone(),
            body: post.body.clone(),
        });
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn submit_create(&mut self, cx: &mut AppContext) -> Result<Dispatch, Rejected> {
        let operation = Operation::Create;
        let input = NewPost {
            user_id: DEFAULT_USER_ID,
            title: self.draft.title.clone(),
            body: self.draft.body.clone(),
        };
        if self.creates.is_pending(&()) {
            return Err(Rejected::InFlight(operation));
        }
        let request = cx
            .client
            .build_create_post(&input)
            .map_err(|e| encoding(operation, e))?;
        self.creates.begin(());
        if self.source.form_reset() == FormReset::OnSubmit {
            self.draft.clear();
        }
        Ok(self.hand_off(cx, operation, request))
    }

    /// Send the edit form. A no-op rejection when nothing is under edit.
    pub fn submit_update(&mut self, cx: &mut AppContext) -> Result<Dispatch, Rejected> {
        let form = self.editing.as_ref().ok_or(Rejected::NotEditing)?;
        let operation = Operation::Update(form.id);
        if self.updates.is_pending(&form.id) {
            return Err(Rejected::InFlight(operation));
        }
        let patch = PostPatch {
            user_id: Some(form.user_id),
            title: Some(form.title.clone()),
            body: Some(form.body.clone()),
        };
        let request = cx
            .client
            .build_update_post(form.id, &patch)
            .map_err(|e| encoding(operation, e))?;
        self.updates.begin(form.id);
        if self.source.form_reset() == FormReset::OnSubmit {
            self.editing = None;
        }
        Ok(self.hand_off(cx, operation, request))
    }

    pub fn submit_delete(&mut self, cx: &mut AppContext, id: u64) -> Result<Dispatch, Rejected> {
        let operation = Operation::Delete(id);
        if !self.source.list(cx).posts().iter().any(|p| p.id == id) {
            return Err(Rejected::UnknownPost(id));
        }
        if !self.deletes.begin(id) {
            return Err(Rejected::InFlight(operation));
        }
        let request = cx.client.build_delete_post(id);
        Ok(self.hand_off(cx, operation, request))
    }

    /// Apply the host's reply for request `id`. Returns `None` for ids this
    /// screen did not issue.
    pub fn complete(
        &mut self,
        cx: &mut AppContext,
        id: RequestId,
        reply: Reply,
    ) -> Option<Completion> {
        let operation = self.pending.remove(&id)?;
        let reply =
            reply.inspect_err(|e| tracing::error!(%operation, error = %e, "request failed"));

        let completion = match operation {
            Operation::List => {
                let result = reply.and_then(|r| cx.client.parse_list_posts(r));
                self.source.list_completed(cx, id, result);
                Completion::default()
            }
            Operation::Create => {
                let result = reply.and_then(|r| cx.client.parse_create_post(r));
                match result {
                    Ok(post) => {
                        self.creates.succeed(&());
                        tracing::info!(id = post.id, "post created");
                        if self.source.form_reset() == FormReset::OnSuccess {
                            self.draft.clear();
                        }
                        self.applied(cx, Applied::Created(post.clone()), Outcome::Created(post))
                    }
                    Err(error) => {
                        self.creates.fail(&(), error.clone());
                        failed(operation, error)
                    }
                }
            }
            Operation::Update(post_id) => {
                let result = reply.and_then(|r| cx.client.parse_update_post(r));
                match result {
                    Ok(post) => {
                        self.updates.succeed(&post_id);
                        tracing::info!(id = post.id, "post updated");
                        if self.editing.as_ref().is_some_and(|form| form.id == post_id) {
                            self.editing = None;
                        }
                        self.applied(cx, Applied::Updated(post.clone()), Outcome::Updated(post))
                    }
                    Err(error) => {
                        self.updates.fail(&post_id, error.clone());
                        failed(operation, error)
                    }
                }
            }
            Operation::Delete(post_id) => {
                let result = reply.and_then(|r| cx.client.parse_delete_post(r));
                match result {
                    Ok(()) => {
                        self.deletes.succeed(&post_id);
                        tracing::info!(id = post_id, "post deleted");
                        if self.editing.as_ref().is_some_and(|form| form.id == post_id) {
                            self.editing = None;
                        }
                        self.applied(cx, Applied::Deleted(post_id), Outcome::Deleted(post_id))
                    }
                    Err(error) => {
                        self.deletes.fail(&post_id, error.clone());
                        failed(operation, error)
                    }
                }
            }
        };

        if let Some(outcome) = &completion.outcome {
            self.last_outcome = Some(outcome.clone());
        }
        Some(completion)
    }

    pub fn view<'a>(&'a self, cx: &'a AppContext) -> ScreenView<'a> {
        ScreenView {
            title: self.title,
            draft: &self.draft,
            editing: self.editing.as_ref(),
            list: self.source.list(cx),
            creating: self.creates.is_pending(&()),
            last_outcome: self.last_outcome.as_ref(),
        }
    }

    fn applied(&mut self, cx: &mut AppContext, applied: Applied, outcome: Outcome) -> Completion {
        let refetch = self.source.mutation_applied(cx, &applied);
        Completion {
            outcome: Some(outcome),
            dispatches: self.track(refetch),
        }
    }

    fn hand_off(
        &mut self,
        cx: &mut AppContext,
        operation: Operation,
        request: HttpRequest,
    ) -> Dispatch {
        let dispatch = Dispatch {
            id: cx.next_request_id(),
            operation,
            request,
        };
        self.pending.insert(dispatch.id, operation);
        dispatch
    }

    fn track(&mut self, dispatch: Option<Dispatch>) -> Vec<Dispatch> {
        let Some(dispatch) = dispatch else {
            return Vec::new();
        };
        self.pending.insert(dispatch.id, dispatch.operation);
        vec![dispatch]
    }
}

fn encoding(operation: Operation, error: ApiError) -> Rejected {
    tracing::error!(%operation, error = %error, "request body could not be encoded");
    Rejected::Encoding(error.to_string())
}

fn failed(operation: Operation, error: ApiError) -> Completion {
    tracing::error!(%operation, error = %error, "mutation failed");
    Completion {
        outcome: Some(Outcome::Failed { operation, error }),
        dispatches: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use crate::config::ClientConfig;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::source::{CachedSource, ManualSource};

    fn cx() -> AppContext {
        AppContext::new(ClientConfig::new("http://localhost:3000"))
    }

    fn json(status: u16, value: serde_json::Value) -> Reply {
        Ok(HttpResponse::new(status, value.to_string()))
    }

    fn seeded_manual(cx: &mut AppContext) -> PostsScreen<ManualSource> {
        let mut screen = PostsScreen::new("Tab One", ManualSource::new());
        let load = screen.mount(cx).remove(0);
        screen
            .complete(
                cx,
                load.id,
                json(
                    200,
                    serde_json::json!([{ "userId": 1, "id": 1, "title": "A", "body": "b" }]),
                ),
            )
            .unwrap();
        screen
    }

    fn seeded_cached(cx: &mut AppContext) -> PostsScreen<CachedSource> {
        let mut screen = PostsScreen::new("Tab Two", CachedSource::default());
        let load = screen.mount(cx).remove(0);
        screen
            .complete(
                cx,
                load.id,
                json(
                    200,
                    serde_json::json!([{ "userId": 1, "id": 1, "title": "A", "body": "b" }]),
                ),
            )
            .unwrap();
        screen
    }

    #[test]
    fn create_prepends_confirmed_post() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.set_draft_title("New");
        screen.set_draft_body("nb");

        let dispatch = screen.submit_create(&mut cx).unwrap();
        assert_eq!(dispatch.request.method, HttpMethod::Post);
        assert_eq!(screen.draft().title, "New", "manual screen keeps input until confirmed");

        let completion = screen
            .complete(
                &mut cx,
                dispatch.id,
                json(
                    201,
                    serde_json::json!({ "userId": 1, "id": 2, "title": "New", "body": "nb" }),
                ),
            )
            .unwrap();

        assert!(matches!(completion.outcome, Some(Outcome::Created(ref p)) if p.id == 2));
        assert!(completion.dispatches.is_empty());
        let ids: Vec<u64> = screen.view(&cx).list.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(screen.draft(), &Draft::default());
    }

    #[test]
    fn double_create_is_refused_while_pending() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.submit_create(&mut cx).unwrap();
        assert!(screen.view(&cx).creating);
        assert_eq!(
            screen.submit_create(&mut cx).unwrap_err(),
            Rejected::InFlight(Operation::Create)
        );
    }

    #[test]
    fn update_replaces_title_in_original_position() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.begin_edit(&cx, 1).unwrap();
        assert_eq!(screen.editing().unwrap().title, "A");
        screen.set_edit_title("Z");

        let dispatch = screen.submit_update(&mut cx).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(dispatch.request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "userId": 1, "title": "Z", "body": "b" }));

        screen
            .complete(
                &mut cx,
                dispatch.id,
                json(200, serde_json::json!({ "userId": 1, "id": 1, "title": "Z", "body": "b" })),
            )
            .unwrap();

        let view = screen.view(&cx);
        assert_eq!(view.list.posts().len(), 1);
        assert_eq!(view.list.posts()[0].title, "Z");
        assert!(view.editing.is_none());
    }

    #[test]
    fn update_without_edit_is_a_no_op() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        assert_eq!(screen.submit_update(&mut cx).unwrap_err(), Rejected::NotEditing);
        assert_eq!(screen.in_flight(), 0);
    }

    #[test]
    fn failed_update_leaves_list_and_form_untouched() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.begin_edit(&cx, 1).unwrap();
        screen.set_edit_title("Z");
        let dispatch = screen.submit_update(&mut cx).unwrap();

        let completion = screen
            .complete(&mut cx, dispatch.id, Err(ApiError::Transport("timed out".into())))
            .unwrap();

        assert!(completion.outcome.unwrap().is_failure());
        assert_eq!(screen.view(&cx).list.posts()[0].title, "A");
        assert_eq!(screen.editing().unwrap().title, "Z");
        assert!(screen.last_outcome().unwrap().is_failure());
    }

    #[test]
    fn delete_under_edit_clears_form() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.begin_edit(&cx, 1).unwrap();

        let dispatch = screen.submit_delete(&mut cx, 1).unwrap();
        assert_eq!(dispatch.request.method, HttpMethod::Delete);
        screen
            .complete(&mut cx, dispatch.id, json(200, serde_json::json!({})))
            .unwrap();

        assert!(screen.view(&cx).list.posts().is_empty());
        assert!(screen.editing().is_none());
    }

    #[test]
    fn delete_unknown_post_is_rejected() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        assert_eq!(
            screen.submit_delete(&mut cx, 99).unwrap_err(),
            Rejected::UnknownPost(99)
        );
    }

    #[test]
    fn reply_for_settled_request_is_ignored() {
        let mut cx = cx();
        let mut screen = seeded_manual(&mut cx);
        screen.set_draft_title("first");
        let first = screen.submit_create(&mut cx).unwrap();
        screen
            .complete(&mut cx, first.id, Err(ApiError::Transport("reset".into())))
            .unwrap();
        let second = screen.submit_create(&mut cx).unwrap();
        screen
            .complete(
                &mut cx,
                second.id,
                json(
                    201,
                    serde_json::json!({ "userId": 1, "id": 5, "title": "first", "body": "" }),
                ),
            )
            .unwrap();
        assert!(screen.complete(&mut cx, first.id, json(201, serde_json::json!({}))).is_none());
        assert_eq!(screen.view(&cx).list.posts()[0].id, 5);
    }

    #[test]
    fn cached_create_clears_draft_at_submit_and_refetches_on_success() {
        let mut cx = cx();
        let mut screen = seeded_cached(&mut cx);
        screen.set_draft_title("New");

        let dispatch = screen.submit_create(&mut cx).unwrap();
        assert_eq!(screen.draft(), &Draft::default());

        let completion = screen
            .complete(
                &mut cx,
                dispatch.id,
                json(201, serde_json::json!({ "userId": 1, "id": 2, "title": "New", "body": "" })),
            )
            .unwrap();

        assert_eq!(completion.dispatches.len(), 1);
        assert_eq!(completion.dispatches[0].operation, Operation::List);
        // The list is not patched locally; it waits for the refetch.
        assert_eq!(screen.view(&cx).list.posts().len(), 1);

        let refetch = completion.dispatches[0].id;
        screen
            .complete(
                &mut cx,
                refetch,
                json(
                    200,
                    serde_json::json!([
                        { "userId": 1, "id": 2, "title": "New", "body": "" },
                        { "userId": 1, "id": 1, "title": "A", "body": "b" }
                    ]),
                ),
            )
            .unwrap();
        assert_eq!(screen.view(&cx).list.posts().len(), 2);
    }

    #[test]
    fn cached_failed_mutation_keeps_last_good_list() {
        let mut cx = cx();
        let mut screen = seeded_cached(&mut cx);
        let dispatch = screen.submit_delete(&mut cx, 1).unwrap();
        let completion = screen
            .complete(&mut cx, dispatch.id, Ok(HttpResponse::new(500, "boom")))
            .unwrap();

        assert!(completion.dispatches.is_empty());
        assert!(matches!(
            completion.outcome,
            Some(Outcome::Failed { error: ApiError::Http { status: 500, .. }, .. })
        ));
        assert_eq!(screen.view(&cx).list.posts().len(), 1);
    }

    #[test]
    fn cached_update_clears_edit_at_submit() {
        let mut cx = cx();
        let mut screen = seeded_cached(&mut cx);
        screen.begin_edit(&cx, 1).unwrap();
        screen.submit_update(&mut cx).unwrap();
        assert!(screen.editing().is_none());
    }

    #[test]
    fn cached_failed_refetch_shows_error() {
        let mut cx = cx();
        let mut screen = seeded_cached(&mut cx);
        let refetch = screen.focus(&mut cx).remove(0);
        screen
            .complete(&mut cx, refetch.id, Err(ApiError::Transport("offline".into())))
            .unwrap();
        assert!(matches!(screen.view(&cx).list, ListState::Error(_)));
    }

    #[test]
    fn write_during_refetch_supersedes_stale_list() {
        let mut cx = cx();
        let mut screen = seeded_cached(&mut cx);
        let stale = screen.focus(&mut cx).remove(0);
        screen.set_draft_title("New");
        let create = screen.submit_create(&mut cx).unwrap();

        let completion = screen
            .complete(
                &mut cx,
                create.id,
                json(201, serde_json::json!({ "userId": 1, "id": 2, "title": "New", "body": "" })),
            )
            .unwrap();
        assert_eq!(completion.dispatches.len(), 1);
        let refetch = &completion.dispatches[0];
        assert_eq!(refetch.operation, Operation::List);

        // The focus fetch was read before the write landed.
        let dropped = screen
            .complete(
                &mut cx,
                stale.id,
                json(200, serde_json::json!([{ "userId": 1, "id": 1, "title": "A", "body": "b" }])),
            )
            .unwrap();
        assert!(dropped.dispatches.is_empty());
        assert_eq!(screen.view(&cx).list.posts().len(), 1);
        assert!(cx.cache.is_fetching(&QueryKey::posts()));

        screen
            .complete(
                &mut cx,
                refetch.id,
                json(
                    200,
                    serde_json::json!([
                        { "userId": 1, "id": 2, "title": "New", "body": "" },
                        { "userId": 1, "id": 1, "title": "A", "body": "b" }
                    ]),
                ),
            )
            .unwrap();
        let ids: Vec<u64> = screen.view(&cx).list.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn encoding_rejection_keeps_the_cause() {
        let rejected = encoding(
            Operation::Create,
            ApiError::Serialization("key must be a string".into()),
        );
        assert!(matches!(rejected, Rejected::Encoding(ref cause) if cause.contains("key must be")));
        assert!(rejected.to_string().contains("key must be a string"));
    }
}
