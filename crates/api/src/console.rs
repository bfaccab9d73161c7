//! Console command parsing for the `userdesk` binary

use userdesk_domain::{Credentials, UserInput};

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Login(Option<Credentials>),
    Logout,
    Users,
    Add(UserInput),
    Edit(i64, UserInput),
    Delete(i64),
    WhoAmI,
    Help,
    Quit,
}

/// Usage text printed by `help` and on parse errors.
pub const USAGE: &str = "\
Commands:
  login [user] [password]            sign in
  logout                             sign out
  users                              list users
  add <name> <email> <phone>         create a user
  edit <id> <name> <email> <phone>   update a user
  delete <id>                        delete a user
  whoami                             show the session
  quit                               exit";

/// Parse a console line. Blank lines yield `Ok(None)`.
///
/// Names may contain spaces: every word before the last two is part of the
/// name.
///
/// # Errors
/// Returns a message for unknown commands and malformed arguments.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = words.split_first() else {
        return Ok(None);
    };

    let parsed = match command.to_ascii_lowercase().as_str() {
        "login" => match args {
            [] => ConsoleCommand::Login(None),
            [username] => ConsoleCommand::Login(Some(Credentials::new(*username, ""))),
            [username, password] => {
                ConsoleCommand::Login(Some(Credentials::new(*username, *password)))
            }
            _ => return Err("usage: login [user] [password]".to_string()),
        },
        "logout" => ConsoleCommand::Logout,
        "users" | "list" => ConsoleCommand::Users,
        "add" => ConsoleCommand::Add(
            user_input(args).ok_or("usage: add <name> <email> <phone>")?,
        ),
        "edit" => {
            let (id, rest) = args.split_first().ok_or("usage: edit <id> <name> <email> <phone>")?;
            let input = user_input(rest).ok_or("usage: edit <id> <name> <email> <phone>")?;
            ConsoleCommand::Edit(parse_id(id)?, input)
        }
        "delete" => match args {
            [id] => ConsoleCommand::Delete(parse_id(id)?),
            _ => return Err("usage: delete <id>".to_string()),
        },
        "whoami" => ConsoleCommand::WhoAmI,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(parsed))
}

fn user_input(args: &[&str]) -> Option<UserInput> {
    match args {
        [name @ .., email, phone] if !name.is_empty() => {
            Some(UserInput::new(name.join(" "), *email, *phone))
        }
        _ => None,
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse().map_err(|_| format!("invalid user id '{raw}'"))
}
