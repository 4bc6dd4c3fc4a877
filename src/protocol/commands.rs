//! Module `commands`
//!
//! Defines the shell command set, the result of running a command, and the
//! parser turning an input line into a [`Command`].

/// A parsed shell command.
///
/// Path arguments are kept raw; they are resolved against the session's
/// working directory by the handlers.
#[derive(Debug, PartialEq)]
pub enum Command {
    PWD,
    CD(String),
    LS { all: bool, path: Option<String> },
    TREE(Option<String>),
    MKDIR(String),
    TOUCH(String),
    WRITE(String, String),   // Path, content
    APPEND(String, String),  // Append with separator
    APPENDN(String, String), // Append without separator
    CAT(String),
    JSON(String),
    CP(String, String),
    MV(String, String),
    RM(String),
    RMDIR { recursive: bool, path: String },
    EXISTS(String),
    STAT(String),
    FLAG(String, String),
    UNFLAG(String, String),
    FLAGS(String),
    EXPORT(String),
    IMPORT { force: bool, target: String, json: String },
    FORBID(String),
    UNFORBID(String),
    STRICT(bool),
    LOCK,
    STATUS,
    HELP,
    QUIT,
    UNKNOWN, // Unknown command or bad arguments
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Status and reply of one command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Splits off the first whitespace-delimited token.
fn split_first(arg: &str) -> (&str, &str) {
    let mut parts = arg.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim_start();
    (first, rest)
}

/// Parses `path rest`, where `rest` may be empty.
fn path_and_text(arg: &str) -> Option<(String, String)> {
    let (path, text) = split_first(arg);
    if path.is_empty() {
        return None;
    }
    Some((path.to_string(), text.to_string()))
}

/// Parses exactly two tokens.
fn two_paths(arg: &str) -> Option<(String, String)> {
    let (first, rest) = split_first(arg);
    let (second, extra) = split_first(rest);
    if first.is_empty() || second.is_empty() || !extra.is_empty() {
        return None;
    }
    Some((first.to_string(), second.to_string()))
}

/// Strips a leading option such as `-a`, reporting whether it was present.
fn option<'a>(arg: &'a str, name: &str) -> (bool, &'a str) {
    let (first, rest) = split_first(arg);
    if first == name { (true, rest) } else { (false, arg) }
}

fn optional(arg: &str) -> Option<String> {
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}

/// Parses a raw input line into the `Command` enum.
///
/// The verb is case-insensitive. A known verb with missing or extra
/// arguments yields `UNKNOWN`.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let (verb, arg) = split_first(trimmed);
    let cmd = verb.to_ascii_uppercase();

    let parsed = match cmd.as_str() {
        "PWD" => Some(Command::PWD),
        "CD" if !arg.is_empty() => Some(Command::CD(arg.to_string())),
        "LS" => {
            let (all, path) = option(arg, "-a");
            Some(Command::LS {
                all,
                path: optional(path),
            })
        }
        "TREE" => Some(Command::TREE(optional(arg))),
        "MKDIR" if !arg.is_empty() => Some(Command::MKDIR(arg.to_string())),
        "TOUCH" if !arg.is_empty() => Some(Command::TOUCH(arg.to_string())),
        "WRITE" => path_and_text(arg).map(|(p, t)| Command::WRITE(p, t)),
        "APPEND" => path_and_text(arg).map(|(p, t)| Command::APPEND(p, t)),
        "APPENDN" => path_and_text(arg).map(|(p, t)| Command::APPENDN(p, t)),
        "CAT" if !arg.is_empty() => Some(Command::CAT(arg.to_string())),
        "JSON" if !arg.is_empty() => Some(Command::JSON(arg.to_string())),
        "CP" => two_paths(arg).map(|(a, b)| Command::CP(a, b)),
        "MV" => two_paths(arg).map(|(a, b)| Command::MV(a, b)),
        "RM" if !arg.is_empty() => Some(Command::RM(arg.to_string())),
        "RMDIR" => {
            let (recursive, path) = option(arg, "-r");
            optional(path).map(|path| Command::RMDIR { recursive, path })
        }
        "EXISTS" if !arg.is_empty() => Some(Command::EXISTS(arg.to_string())),
        "STAT" if !arg.is_empty() => Some(Command::STAT(arg.to_string())),
        "FLAG" => two_paths(arg).map(|(p, f)| Command::FLAG(p, f)),
        "UNFLAG" => two_paths(arg).map(|(p, f)| Command::UNFLAG(p, f)),
        "FLAGS" if !arg.is_empty() => Some(Command::FLAGS(arg.to_string())),
        "EXPORT" if !arg.is_empty() => Some(Command::EXPORT(arg.to_string())),
        "IMPORT" => {
            let (force, rest) = option(arg, "-f");
            let (target, json) = split_first(rest);
            if target.is_empty() || json.is_empty() {
                None
            } else {
                Some(Command::IMPORT {
                    force,
                    target: target.to_string(),
                    json: json.to_string(),
                })
            }
        }
        "FORBID" if !arg.is_empty() => Some(Command::FORBID(arg.to_string())),
        "UNFORBID" if !arg.is_empty() => Some(Command::UNFORBID(arg.to_string())),
        "STRICT" => match arg.to_ascii_lowercase().as_str() {
            "on" => Some(Command::STRICT(true)),
            "off" => Some(Command::STRICT(false)),
            _ => None,
        },
        "LOCK" => Some(Command::LOCK),
        "STATUS" => Some(Command::STATUS),
        "HELP" => Some(Command::HELP),
        "QUIT" | "Q" | "EXIT" => Some(Command::QUIT),
        _ => None,
    };

    parsed.unwrap_or(Command::UNKNOWN)
}
