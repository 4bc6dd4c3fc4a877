//! Authorization request kinds
//!
//! Each public storage operation asks the agent for exactly one of these.

use std::fmt;

/// Kind of request submitted to the security agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    AnyExist,
    FileExist,
    FolderExist,
    FolderMake,
    FolderHasSubFolders,
    FolderRead,
    FolderRemove,
    FolderImport,
    FolderExport,
    FolderTree,
    FileMake,
    FileWrite,
    FileAppend,
    FileRead,
    FileCopy,
    FileMove,
    FileRemove,
    TableEntry,
    FlagWrite,
    FlagRemove,
    FlagHas,
    FlagRead,
    AgentExist,
}

impl Request {
    /// Wire name of the request, as seen by agents.
    pub fn as_str(self) -> &'static str {
        match self {
            Request::AnyExist => "*/exist",
            Request::FileExist => "file/exist",
            Request::FolderExist => "folder/exist",
            Request::FolderMake => "folder/make",
            Request::FolderHasSubFolders => "folder/has-sub-folders",
            Request::FolderRead => "folder/read",
            Request::FolderRemove => "folder/remove",
            Request::FolderImport => "folder/import",
            Request::FolderExport => "folder/export",
            Request::FolderTree => "folder/tree",
            Request::FileMake => "file/make",
            Request::FileWrite => "file/write",
            Request::FileAppend => "file/append",
            Request::FileRead => "file/read",
            Request::FileCopy => "file/copy",
            Request::FileMove => "file/move",
            Request::FileRemove => "file/remove",
            Request::TableEntry => "*/table-entry",
            Request::FlagWrite => "flag/write",
            Request::FlagRemove => "flag/remove",
            Request::FlagHas => "flag/has",
            Request::FlagRead => "flag/read",
            Request::AgentExist => "agent/exist",
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
