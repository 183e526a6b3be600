//! Where a screen's list of posts comes from.
//!
//! # Design
//! `PostsScreen` implements list/create/edit/update/delete once and defers
//! every decision about the list itself to a `PostSource`:
//!
//! - `ManualSource` keeps its own `Vec<Post>`, fetches once on mount and
//!   patches the list in place after each confirmed mutation. Failures are
//!   only logged; the list silently keeps its last state.
//! - `CachedSource` keeps nothing itself. The list lives in the shared
//!   `QueryCache` under the posts key, is stale as soon as it arrives, is
//!   refetched on every focus, and is invalidated and refetched after each
//!   confirmed mutation.

use crate::cache::{QueryKey, QueryOptions};
use crate::context::AppContext;
use crate::dispatch::{Dispatch, RequestId};
use crate::error::ApiError;
use crate::types::Post;

/// What the list area of a screen shows. The three states are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState<'a> {
    Loading,
    Error(&'a ApiError),
    Ready(&'a [Post]),
}

impl<'a> ListState<'a> {
    pub fn posts(&self) -> &'a [Post] {
        match self {
            ListState::Ready(posts) => posts,
            ListState::Loading | ListState::Error(_) => &[],
        }
    }
}

/// When a screen clears its input fields after a create or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormReset {
    /// As soon as the request is handed off.
    OnSubmit,
    /// Once the server confirms the write.
    OnSuccess,
}

/// A write the server confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Created(Post),
    Updated(Post),
    Deleted(u64),
}

pub trait PostSource {
    /// First time the screen is shown. May request the initial list.
    fn mount(&mut self, cx: &mut AppContext) -> Option<Dispatch>;

    /// The screen became visible again.
    fn focus(&mut self, cx: &mut AppContext) -> Option<Dispatch>;

    fn blur(&mut self, _cx: &mut AppContext) {}

    fn unmount(&mut self, _cx: &mut AppContext) {}

    fn list_completed(
        &mut self,
        cx: &mut AppContext,
        id: RequestId,
        result: Result<Vec<Post>, ApiError>,
    );

    /// Reflect a confirmed write. May request a refetch.
    fn mutation_applied(&mut self, cx: &mut AppContext, applied: &Applied) -> Option<Dispatch>;

    fn list<'a>(&'a self, cx: &'a AppContext) -> ListState<'a>;

    fn form_reset(&self) -> FormReset;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// List held by the screen itself.
#[derive(Debug)]
pub struct ManualSource {
    posts: Vec<Post>,
    phase: Phase,
}

impl Default for ManualSource {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            phase: Phase::Idle,
        }
    }
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }
}

impl PostSource for ManualSource {
    fn mount(&mut self, cx: &mut AppContext) -> Option<Dispatch> {
        self.phase = Phase::Loading;
        Some(cx.list_dispatch())
    }

    fn focus(&mut self, _cx: &mut AppContext) -> Option<Dispatch> {
        None
    }

    fn list_completed(
        &mut self,
        _cx: &mut AppContext,
        _id: RequestId,
        result: Result<Vec<Post>, ApiError>,
    ) {
        match result {
            Ok(posts) => {
                self.posts = posts;
                self.phase = Phase::Loaded;
            }
            // Logged by the screen; nothing is shown.
            Err(_) => self.phase = Phase::Errored,
        }
    }

    fn mutation_applied(&mut self, _cx: &mut AppContext, applied: &Applied) -> Option<Dispatch> {
        match applied {
            Applied::Created(post) => {
                self.posts.retain(|p| p.id != post.id);
                self.posts.insert(0, post.clone());
            }
            Applied::Updated(post) => {
                if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
                    *slot = post.clone();
                }
            }
            Applied::Deleted(id) => self.posts.retain(|p| p.id != *id),
        }
        None
    }

    fn list<'a>(&'a self, _cx: &'a AppContext) -> ListState<'a> {
        ListState::Ready(&self.posts)
    }

    fn form_reset(&self) -> FormReset {
        FormReset::OnSuccess
    }
}

/// List held by the shared query cache.
#[derive(Debug)]
pub struct CachedSource {
    key: QueryKey,
    options: QueryOptions,
    observing: bool,
}

impl Default for CachedSource {
    fn default() -> Self {
        Self::new(QueryKey::posts(), QueryOptions::default())
    }
}

impl CachedSource {
    pub fn new(key: QueryKey, options: QueryOptions) -> Self {
        Self {
            key,
            options,
            observing: false,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Start a fetch unless one is already in flight for the key.
    fn fetch(&self, cx: &mut AppContext) -> Option<Dispatch> {
        if cx.cache.is_fetching(&self.key) {
            return None;
        }
        let dispatch = cx.list_dispatch();
        cx.cache.begin_fetch(&self.key, dispatch.id);
        Some(dispatch)
    }
}

impl PostSource for CachedSource {
    fn mount(&mut self, cx: &mut AppContext) -> Option<Dispatch> {
        self.observing = true;
        if cx.cache.observe(&self.key, self.options) {
            self.fetch(cx)
        } else {
            None
        }
    }

    fn focus(&mut self, cx: &mut AppContext) -> Option<Dispatch> {
        if cx.cache.should_refetch_on_focus(&self.key) {
            self.fetch(cx)
        } else {
            None
        }
    }

    fn unmount(&mut self, cx: &mut AppContext) {
        if self.observing {
            cx.cache.unobserve(&self.key);
            self.observing = false;
        }
    }

    fn list_completed(
        &mut self,
        cx: &mut AppContext,
        id: RequestId,
        result: Result<Vec<Post>, ApiError>,
    ) {
        cx.cache.resolve(&self.key, id, result);
    }

    fn mutation_applied(&mut self, cx: &mut AppContext, _applied: &Applied) -> Option<Dispatch> {
        cx.cache.invalidate(&self.key);
        // A fetch already in flight may have been read before the write, so
        // the refetch replaces it instead of joining it.
        let dispatch = cx.list_dispatch();
        cx.cache.restart_fetch(&self.key, dispatch.id);
        Some(dispatch)
    }

    fn list<'a>(&'a self, cx: &'a AppContext) -> ListState<'a> {
        let state = cx.cache.state(&self.key);
        if state.is_loading {
            return ListState::Loading;
        }
        if let Some(err) = state.error {
            return ListState::Error(err);
        }
        ListState::Ready(state.data.map(Vec::as_slice).unwrap_or(&[]))
    }

    fn form_reset(&self) -> FormReset {
        FormReset::OnSubmit
    }
}
