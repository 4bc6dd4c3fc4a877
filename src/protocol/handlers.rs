//! Command handlers module for the RAX VFS shell.
//!
//! This module defines handler functions for shell commands. Each handler
//! resolves its path arguments against the session's working directory,
//! calls into the storage and turns the outcome into a reply.

use chrono::{DateTime, SecondsFormat};
use log::info;

use crate::client::Session;
use crate::error::handlers::{error_to_reply_code, storage_error_code};
use crate::error::{StorageError, VfsError};
use crate::navigate::{change_directory, resolve_path};
use crate::protocol::responses::{DATA, GOODBYE, OK, SYNTAX_ERROR, format_multiline, format_response};
use crate::protocol::{Command, CommandResult, CommandStatus};
use crate::storage::{Directory, Node, Storage};

const HELP_LINES: &[&str] = &[
    "PWD | CD p | LS [-a] [p] | TREE [p]",
    "MKDIR p | TOUCH p | RM p | RMDIR [-r] p",
    "WRITE p text | APPEND p text | APPENDN p text",
    "CAT p | JSON p | CP a b | MV a b",
    "EXISTS p | STAT p",
    "FLAG p chars | UNFLAG p chars | FLAGS p",
    "EXPORT p | IMPORT [-f] target json",
    "FORBID chars | UNFORBID chars | STRICT on|off | LOCK",
    "STATUS | HELP | QUIT",
    "Paths starting with / are absolute, others are relative to PWD.",
    "Flags: h hidden, r read-only, u undeletable.",
];

/// Dispatches a parsed command to its handler.
///
/// # Arguments
///
/// * `storage` - The storage the session operates on.
/// * `session` - Mutable session state (working directory).
/// * `command` - Reference to the parsed command.
///
/// # Returns
///
/// * `CommandResult` - Status of the execution and the reply to send.
pub fn handle_command(storage: &Storage, session: &mut Session, command: &Command) -> CommandResult {
    match command {
        Command::PWD => data(&session.display_cwd()),
        Command::CD(path) => handle_cmd_cd(storage, session, path),
        Command::LS { all, path } => handle_cmd_ls(storage, session, *all, path.as_deref()),
        Command::TREE(path) => handle_cmd_tree(storage, session, path.as_deref()),
        Command::MKDIR(path) => {
            let path = resolve(session, path);
            structural(storage.make_dir(&path), format!("Created folder /{}", path))
        }
        Command::TOUCH(path) => {
            let path = resolve(session, path);
            done(storage.touch_file(&path), "File created")
        }
        Command::WRITE(path, text) => done(storage.write_file(&resolve(session, path), text), "File written"),
        Command::APPEND(path, text) => done(
            storage.append_file(&resolve(session, path), text, false),
            "Content appended",
        ),
        Command::APPENDN(path, text) => done(
            storage.append_file(&resolve(session, path), text, true),
            "Content appended",
        ),
        Command::CAT(path) => match storage.read_file(&resolve(session, path)) {
            Ok(content) => listing(content.lines()),
            Err(e) => failure(&e),
        },
        Command::JSON(path) => match storage.read_json::<serde_json::Value>(&resolve(session, path)) {
            Ok(value) => data(&value.to_string()),
            Err(e) => failure(&e),
        },
        Command::CP(source, dest) => done(
            storage.copy_file(&resolve(session, source), &resolve(session, dest)),
            "File copied",
        ),
        Command::MV(source, dest) => {
            let (source, dest) = (resolve(session, source), resolve(session, dest));
            structural(
                storage.move_file(&source, &dest),
                format!("Moved /{} to /{}", source, dest),
            )
        }
        Command::RM(path) => {
            let path = resolve(session, path);
            structural(storage.remove_file(&path), format!("Removed /{}", path))
        }
        Command::RMDIR { recursive, path } => handle_cmd_rmdir(storage, session, *recursive, path),
        Command::EXISTS(path) => handle_cmd_exists(storage, session, path),
        Command::STAT(path) => handle_cmd_stat(storage, session, path),
        Command::FLAG(path, flags) => done(storage.add_flag(&resolve(session, path), flags), "Flags set"),
        Command::UNFLAG(path, flags) => {
            done(storage.remove_flag(&resolve(session, path), flags), "Flags cleared")
        }
        Command::FLAGS(path) => match storage.get_flags(&resolve(session, path)) {
            Ok(flags) if flags.is_empty() => data("-"),
            Ok(flags) => data(&flags),
            Err(e) => failure(&e),
        },
        Command::EXPORT(path) => {
            match storage
                .export_folder(&resolve(session, path))
                .and_then(|exported| exported.to_json())
            {
                Ok(json) => data(&json),
                Err(e) => failure(&e),
            }
        }
        Command::IMPORT { force, target, json } => handle_cmd_import(storage, session, *force, target, json),
        Command::FORBID(chars) => structural(storage.forbid(chars), format!("Forbidden {:?}", chars)),
        Command::UNFORBID(chars) => {
            structural(storage.unforbid(chars), format!("Allowed {:?}", chars))
        }
        Command::STRICT(true) => structural(storage.enable_strict_forbid(), "Strict mode on".into()),
        Command::STRICT(false) => structural(storage.disable_strict_forbid(), "Strict mode off".into()),
        Command::LOCK => structural(storage.lock(), "Configuration locked".into()),
        Command::STATUS => handle_cmd_status(storage, session),
        Command::HELP => listing(HELP_LINES),
        Command::QUIT => CommandResult {
            status: CommandStatus::CloseConnection,
            message: Some(format_response(GOODBYE, "Goodbye")),
        },
        Command::UNKNOWN => CommandResult {
            status: CommandStatus::Failure("Unknown command".into()),
            message: Some(format_response(
                SYNTAX_ERROR,
                "Syntax error, command unrecognized",
            )),
        },
    }
}

/// Resolves a shell argument to the path string handed to the storage.
fn resolve(session: &Session, raw: &str) -> String {
    resolve_path(session.cwd(), raw).joined()
}

fn data(message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(DATA, message)),
    }
}

fn listing<I, S>(lines: I) -> CommandResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_multiline(DATA, lines)),
    }
}

fn failure(err: &StorageError) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(err.to_string()),
        message: Some(format_response(storage_error_code(err), &err.to_string())),
    }
}

fn done(result: Result<(), StorageError>, message: &str) -> CommandResult {
    match result {
        Ok(()) => CommandResult {
            status: CommandStatus::Success,
            message: Some(format_response(OK, message)),
        },
        Err(e) => failure(&e),
    }
}

/// Like [`done`], also logging the change.
fn structural(result: Result<(), StorageError>, message: String) -> CommandResult {
    if result.is_ok() {
        info!("{}", message);
    }
    done(result, &message)
}

/// Handles the CD command: validates the target folder and moves the session there.
fn handle_cmd_cd(storage: &Storage, session: &mut Session, path: &str) -> CommandResult {
    match change_directory(storage, session.cwd(), path) {
        Ok(cwd) => {
            session.set_cwd(cwd);
            CommandResult {
                status: CommandStatus::Success,
                message: Some(format_response(
                    OK,
                    &format!("Directory changed to {}", session.display_cwd()),
                )),
            }
        }
        Err(e) => {
            let message = e.to_string();
            let code = error_to_reply_code(&VfsError::Navigate(e));
            CommandResult {
                status: CommandStatus::Failure(message.clone()),
                message: Some(format_response(code, &message)),
            }
        }
    }
}

/// Handles the LS command: lists a folder, marking sub-folders with a trailing `/`.
fn handle_cmd_ls(
    storage: &Storage,
    session: &Session,
    all: bool,
    path: Option<&str>,
) -> CommandResult {
    let folder = resolve_path(session.cwd(), path.unwrap_or("."));
    match storage.read_dir(&folder.joined(), all) {
        Ok(names) => listing(names.into_iter().map(|name| {
            if storage.dir_exists(&folder.join(&name).joined()) {
                format!("{}/", name)
            } else {
                name
            }
        })),
        Err(e) => failure(&e),
    }
}

fn render_tree(dir: &Directory, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for (name, node) in dir.iter() {
        match node {
            Node::File(_) => lines.push(format!("{}{}", indent, name)),
            Node::Directory(child) => {
                lines.push(format!("{}{}/", indent, name));
                render_tree(child, depth + 1, lines);
            }
        }
    }
}

/// Handles the TREE command: prints the whole subtree, indented by depth.
fn handle_cmd_tree(storage: &Storage, session: &Session, path: Option<&str>) -> CommandResult {
    match storage.get_tree(&resolve(session, path.unwrap_or("."))) {
        Ok(tree) => {
            let mut lines = Vec::new();
            render_tree(&tree, 0, &mut lines);
            listing(lines)
        }
        Err(e) => failure(&e),
    }
}

/// Handles the RMDIR command.
fn handle_cmd_rmdir(
    storage: &Storage,
    session: &Session,
    recursive: bool,
    path: &str,
) -> CommandResult {
    let path = resolve(session, path);
    structural(
        storage.remove_tree(&path, recursive),
        format!("Removed folder /{}", path),
    )
}

/// Handles the EXISTS command: reports the kind of the item, or `none`.
fn handle_cmd_exists(storage: &Storage, session: &Session, path: &str) -> CommandResult {
    let path = resolve(session, path);
    if storage.file_exists(&path) {
        data("file")
    } else if storage.dir_exists(&path) {
        data("folder")
    } else {
        data("none")
    }
}

fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

/// Handles the STAT command: shows the table entry of an item.
fn handle_cmd_stat(storage: &Storage, session: &Session, path: &str) -> CommandResult {
    match storage.get_table_entry(&resolve(session, path)) {
        Ok(entry) => data(&format!(
            "created={} modified={} flags={}",
            format_time(entry.created_at()),
            format_time(entry.modified_at()),
            entry.flags()
        )),
        Err(e) => failure(&e),
    }
}

/// Handles the IMPORT command: parses the JSON payload and imports it at `target`.
fn handle_cmd_import(
    storage: &Storage,
    session: &Session,
    force: bool,
    target: &str,
    json: &str,
) -> CommandResult {
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => return failure(&StorageError::Parse(e)),
    };

    let target = resolve(session, target);
    structural(
        storage.import_json(&value, Some(&target), force),
        format!("Imported into /{}", target),
    )
}

/// Handles the STATUS command: shows session and policy state.
fn handle_cmd_status(storage: &Storage, session: &Session) -> CommandResult {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    listing([
        format!("cwd: {}", session.display_cwd()),
        format!("forbidden: {}", storage.forbidden_chars()),
        format!("strict: {}", on_off(storage.is_strict_forbid())),
        format!("locked: {}", on_off(storage.is_locked())),
        format!("agent: {}", on_off(storage.is_agent())),
    ])
}
