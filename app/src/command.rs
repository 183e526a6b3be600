//! Line commands read from stdin.

use std::str::FromStr;

use posts_core::Tab;

pub const HELP: &str = "\
commands:
  tab one|two        switch tabs (mounts a tab the first time)
  title <text>       set the new post's title
  body <text>        set the new post's body
  create             submit the new post
  edit <id>          start editing a listed post
  edit-title <text>  change the edited title
  edit-body <text>   change the edited body
  update             submit the edit
  cancel             leave the edit form
  delete <id>        delete a listed post
  focus              refocus the active tab
  show               print the active tab
  help               print this text
  quit               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(Tab),
    Title(String),
    Body(String),
    Create,
    Edit(u64),
    EditTitle(String),
    EditBody(String),
    Update,
    Cancel,
    Delete(u64),
    Focus,
    Show,
    Help,
    Quit,
}

fn parse_id(arg: &str) -> Result<u64, String> {
    arg.parse().map_err(|_| format!("not a post id: {arg:?}"))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let bare = |cmd: Command| {
            if rest.is_empty() {
                Ok(cmd)
            } else {
                Err(format!("{word} takes no argument"))
            }
        };

        match word {
            "tab" => rest.parse().map(Command::Tab),
            "title" => Ok(Command::Title(rest.to_string())),
            "body" => Ok(Command::Body(rest.to_string())),
            "edit-title" => Ok(Command::EditTitle(rest.to_string())),
            "edit-body" => Ok(Command::EditBody(rest.to_string())),
            "edit" => parse_id(rest).map(Command::Edit),
            "delete" => parse_id(rest).map(Command::Delete),
            "create" => bare(Command::Create),
            "update" => bare(Command::Update),
            "cancel" => bare(Command::Cancel),
            "focus" => bare(Command::Focus),
            "show" => bare(Command::Show),
            "help" | "?" => bare(Command::Help),
            "quit" | "exit" => bare(Command::Quit),
            other => Err(format!("unknown command: {other:?} (try `help`)")),
        }
    }
}
