//! Line commands typed at the console prompt.

use shared::domain::{SortDirection, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Show,
    Page(u32),
    Size(u32),
    Sort {
        field: String,
        direction: SortDirection,
    },
    Toggle(String),
    Search(String),
    Next,
    Previous,
    Reload,
    Delete(UserId),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  show                      print the current page
  page <n>                  jump to page n
  size <n>                  rows per page
  sort <field> [asc|desc]   sort by field
  toggle <field>            header click on field
  search <text>             debounced search (empty text clears)
  next | prev               page navigation
  reload                    fetch the current page again
  delete <id>               delete a visible row
  help | quit";

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    match verb.to_ascii_lowercase().as_str() {
        "" | "show" | "ls" => Ok(ConsoleCommand::Show),
        "page" => parse_number(rest).map(ConsoleCommand::Page),
        "size" => parse_number(rest).map(ConsoleCommand::Size),
        "sort" => {
            let mut parts = rest.split_whitespace();
            let field = parts.next().ok_or("usage: sort <field> [asc|desc]")?;
            let direction = match parts.next() {
                Some(raw) => raw.parse().map_err(|e| format!("{e}"))?,
                None => SortDirection::Asc,
            };
            Ok(ConsoleCommand::Sort {
                field: field.to_string(),
                direction,
            })
        }
        "toggle" if !rest.is_empty() => Ok(ConsoleCommand::Toggle(rest.to_string())),
        "toggle" => Err("usage: toggle <field>".into()),
        "search" | "find" => Ok(ConsoleCommand::Search(rest.to_string())),
        "next" | "n" => Ok(ConsoleCommand::Next),
        "prev" | "previous" | "p" => Ok(ConsoleCommand::Previous),
        "reload" | "r" => Ok(ConsoleCommand::Reload),
        "delete" | "rm" => rest
            .parse::<i64>()
            .map(|id| ConsoleCommand::Delete(UserId(id)))
            .map_err(|_| "usage: delete <id>".to_string()),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn parse_number(raw: &str) -> Result<u32, String> {
    raw.parse()
        .map_err(|_| format!("expected a non-negative number, got '{raw}'"))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
