//! Application shell: one context, two tabs.
//!
//! # Design
//! `App` creates the `AppContext` (client and query cache) exactly once and
//! passes it explicitly to whichever screen handles an event. Tab one keeps
//! its own list; tab two reads from the cache. The tabs share no state, so a
//! write made in one tab shows up in the other only after that tab refetches.
//!
//! Tabs mount lazily on first visit and stay mounted. Every request handed to
//! the host is remembered with the tab that issued it, so a reply arriving
//! after the user switched tabs still reaches the right screen.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::dispatch::{Dispatch, Reply, RequestId};
use crate::screen::{Completion, PostsScreen, Rejected, ScreenView};
use crate::source::{CachedSource, ManualSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    One,
    Two,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::One => f.write_str("one"),
            Tab::Two => f.write_str("two"),
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" | "1" => Ok(Tab::One),
            "two" | "2" => Ok(Tab::Two),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

/// Run `$body` with `$screen` bound to the screen of `$tab` and `$cx` to the
/// context. Each arm is monomorphic, so no trait object is needed.
macro_rules! with_screen {
    ($app:expr, $tab:expr, |$screen:ident, $cx:ident| $body:expr) => {
        match $tab {
            Tab::One => {
                let $screen = &mut $app.one;
                let $cx = &mut $app.cx;
                $body
            }
            Tab::Two => {
                let $screen = &mut $app.two;
                let $cx = &mut $app.cx;
                $body
            }
        }
    };
}

#[derive(Debug)]
pub struct App {
    cx: AppContext,
    one: PostsScreen<ManualSource>,
    two: PostsScreen<CachedSource>,
    active: Tab,
    owners: HashMap<RequestId, Tab>,
}

impl App {
    pub fn new(config: ClientConfig) -> Self {
        tracing::debug!(
            base_url = %config.base_url,
            timeout = ?config.timeout,
            "creating app context"
        );
        Self {
            cx: AppContext::new(config),
            one: PostsScreen::new("Tab One", ManualSource::new()),
            two: PostsScreen::new("Tab Two", CachedSource::default()),
            active: Tab::One,
            owners: HashMap::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.cx
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    pub fn tab_one(&self) -> &PostsScreen<ManualSource> {
        &self.one
    }

    pub fn tab_two(&self) -> &PostsScreen<CachedSource> {
        &self.two
    }

    /// Show the initial tab.
    pub fn start(&mut self) -> Vec<Dispatch> {
        let tab = self.active;
        self.show(tab)
    }

    pub fn select_tab(&mut self, tab: Tab) -> Vec<Dispatch> {
        if tab == self.active {
            return Vec::new();
        }
        let previous = self.active;
        with_screen!(self, previous, |screen, cx| screen.blur(cx));
        self.active = tab;
        self.show(tab)
    }

    /// The host regained visual focus.
    pub fn resume(&mut self) -> Vec<Dispatch> {
        let tab = self.active;
        let dispatches = with_screen!(self, tab, |screen, cx| screen.focus(cx));
        self.own(tab, dispatches)
    }

    pub fn set_draft_title(&mut self, title: &str) {
        with_screen!(self, self.active, |screen, _cx| screen.set_draft_title(title))
    }

    pub fn set_draft_body(&mut self, body: &str) {
        with_screen!(self, self.active, |screen, _cx| screen.set_draft_body(body))
    }

    pub fn set_edit_title(&mut self, title: &str) {
        with_screen!(self, self.active, |screen, _cx| screen.set_edit_title(title))
    }

    pub fn set_edit_body(&mut self, body: &str) {
        with_screen!(self, self.active, |screen, _cx| screen.set_edit_body(body))
    }

    pub fn begin_edit(&mut self, id: u64) -> Result<(), Rejected> {
        with_screen!(self, self.active, |screen, cx| screen.begin_edit(cx, id))
    }

    pub fn cancel_edit(&mut self) {
        with_screen!(self, self.active, |screen, _cx| screen.cancel_edit())
    }

    pub fn submit_create(&mut self) -> Result<Dispatch, Rejected> {
        let tab = self.active;
        let dispatch = with_screen!(self, tab, |screen, cx| screen.submit_create(cx))?;
        Ok(self.own_one(tab, dispatch))
    }

    pub fn submit_update(&mut self) -> Result<Dispatch, Rejected> {
        let tab = self.active;
        let dispatch = with_screen!(self, tab, |screen, cx| screen.submit_update(cx))?;
        Ok(self.own_one(tab, dispatch))
    }

    pub fn submit_delete(&mut self, id: u64) -> Result<Dispatch, Rejected> {
        let tab = self.active;
        let dispatch = with_screen!(self, tab, |screen, cx| screen.submit_delete(cx, id))?;
        Ok(self.own_one(tab, dispatch))
    }

    /// Deliver the host's reply for request `id` to the tab that issued it.
    pub fn complete(&mut self, id: RequestId, reply: Reply) -> Option<Completion> {
        let Some(tab) = self.owners.remove(&id) else {
            tracing::debug!(%id, "reply for unknown request");
            return None;
        };
        let mut completion = with_screen!(self, tab, |screen, cx| screen.complete(cx, id, reply))?;
        completion.dispatches = self.own(tab, std::mem::take(&mut completion.dispatches));
        Some(completion)
    }

    /// Requests handed out and not yet completed, across both tabs.
    pub fn in_flight(&self) -> usize {
        self.owners.len()
    }

    pub fn view(&self) -> ScreenView<'_> {
        match self.active {
            Tab::One => self.one.view(&self.cx),
            Tab::Two => self.two.view(&self.cx),
        }
    }

    /// Unmount both tabs and drop the cache. Replies still in flight are
    /// ignored by the host once the app is gone.
    pub fn shutdown(mut self) {
        self.one.unmount(&mut self.cx);
        self.two.unmount(&mut self.cx);
        self.cx.cache.clear();
        tracing::debug!(abandoned = self.owners.len(), "app shut down");
    }

    fn show(&mut self, tab: Tab) -> Vec<Dispatch> {
        let dispatches = with_screen!(self, tab, |screen, cx| {
            if screen.is_mounted() {
                screen.focus(cx)
            } else {
                screen.mount(cx)
            }
        });
        self.own(tab, dispatches)
    }

    fn own(&mut self, tab: Tab, dispatches: Vec<Dispatch>) -> Vec<Dispatch> {
        for dispatch in &dispatches {
            self.owners.insert(dispatch.id, tab);
        }
        dispatches
    }

    fn own_one(&mut self, tab: Tab, dispatch: Dispatch) -> Dispatch {
        self.owners.insert(dispatch.id, tab);
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Operation;
    use crate::http::HttpResponse;
    use crate::source::{ListState, Phase};

    fn app() -> App {
        App::new(ClientConfig::new("http://localhost:3000"))
    }

    fn posts_reply(ids: &[u64]) -> Reply {
        let posts: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({ "userId": 1, "id": id, "title": format!("t{id}"), "body": "b" })
            })
            .collect();
        Ok(HttpResponse::new(200, serde_json::Value::from(posts).to_string()))
    }

    #[test]
    fn start_mounts_only_the_first_tab() {
        let mut app = app();
        let dispatches = app.start();
        assert_eq!(dispatches.len(), 1);
        assert_eq!(dispatches[0].operation, Operation::List);
        assert!(app.tab_one().is_mounted());
        assert!(!app.tab_two().is_mounted());
    }

    #[test]
    fn tab_two_refetches_on_every_return() {
        let mut app = app();
        let first = app.start().remove(0);
        app.complete(first.id, posts_reply(&[1]));

        let load = app.select_tab(Tab::Two).remove(0);
        assert_eq!(app.view().list, ListState::Loading);
        app.complete(load.id, posts_reply(&[1]));

        assert!(app.select_tab(Tab::One).is_empty(), "tab one never refetches");
        let refetch = app.select_tab(Tab::Two);
        assert_eq!(refetch.len(), 1);
        assert_eq!(refetch[0].operation, Operation::List);
    }

    #[test]
    fn resume_refetches_active_cached_tab() {
        let mut app = app();
        app.start();
        let load = app.select_tab(Tab::Two).remove(0);
        app.complete(load.id, posts_reply(&[1]));
        assert_eq!(app.resume().len(), 1);
    }

    #[test]
    fn late_reply_reaches_hidden_tab() {
        let mut app = app();
        let first = app.start().remove(0);
        app.select_tab(Tab::Two);

        app.complete(first.id, posts_reply(&[1, 2]));

        assert_eq!(app.tab_one().source().phase(), Phase::Loaded);
        assert_eq!(app.tab_one().source().posts().len(), 2);
    }

    #[test]
    fn write_in_tab_one_is_not_seen_by_tab_two_until_refetch() {
        let mut app = app();
        let first = app.start().remove(0);
        app.complete(first.id, posts_reply(&[1]));
        let load = app.select_tab(Tab::Two).remove(0);
        app.complete(load.id, posts_reply(&[1]));

        app.select_tab(Tab::One);
        let delete = app.submit_delete(1).unwrap();
        let completion = app.complete(delete.id, Ok(HttpResponse::new(200, "{}"))).unwrap();
        assert!(completion.dispatches.is_empty());
        assert!(app.view().list.posts().is_empty());

        app.select_tab(Tab::Two);
        assert_eq!(app.view().list.posts().len(), 1);
    }

    #[test]
    fn unknown_reply_is_ignored() {
        let mut app = app();
        assert!(app.complete(RequestId(42), posts_reply(&[])).is_none());
    }

    #[test]
    fn tab_parses_from_name_or_number() {
        assert_eq!("two".parse::<Tab>().unwrap(), Tab::Two);
        assert_eq!("1".parse::<Tab>().unwrap(), Tab::One);
        assert!("three".parse::<Tab>().is_err());
    }
}
