//! Plain-text rendering of a `ScreenView`.

use std::fmt::Write;

use posts_core::{ListState, Outcome, ScreenView, Tab};

pub fn render(tab: Tab, view: &ScreenView<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_view(&mut out, tab, view);
    out
}

fn write_view(out: &mut String, tab: Tab, view: &ScreenView<'_>) -> std::fmt::Result {
    writeln!(out, "== {} [tab {tab}] ==", view.title)?;

    write!(out, "new: title={:?} body={:?}", view.draft.title, view.draft.body)?;
    if view.creating {
        write!(out, " (creating...)")?;
    }
    writeln!(out)?;

    if let Some(form) = view.editing {
        writeln!(
            out,
            "editing #{}: title={:?} body={:?}",
            form.id, form.title, form.body
        )?;
    }

    match &view.list {
        ListState::Loading => writeln!(out, "Loading...")?,
        ListState::Error(_) => writeln!(out, "Error loading posts")?,
        ListState::Ready([]) => writeln!(out, "(no posts)")?,
        ListState::Ready(posts) => {
            for post in posts.iter() {
                writeln!(out, "#{} {}", post.id, post.title)?;
                if !post.body.is_empty() {
                    writeln!(out, "    {}", post.body)?;
                }
            }
        }
    }

    if let Some(outcome) = view.last_outcome {
        writeln!(out, "last: {}", describe(outcome))?;
    }
    Ok(())
}

pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created(post) => format!("created post {}", post.id),
        Outcome::Updated(post) => format!("updated post {}", post.id),
        Outcome::Deleted(id) => format!("deleted post {id}"),
        Outcome::Failed { operation, error } => format!("{operation} failed: {error}"),
    }
}
