//! RAX VFS - Entry Point
//!
//! Runs an interactive shell over stdin/stdout on a fresh in-memory storage.

use log::info;
use tokio::io::{BufReader, stdin, stdout};

use rax_vfs::client::handle_session;
use rax_vfs::config::VfsConfig;
use rax_vfs::error::VfsError;
use rax_vfs::error::handlers::handle_error;
use rax_vfs::storage::Storage;

async fn run() -> Result<(), VfsError> {
    let config = VfsConfig::load()?;
    let storage = Storage::from_config(&config, None)?;
    info!(
        "Storage ready (forbidden {:?}, strict {}, locked {})",
        storage.forbidden_chars(),
        storage.is_strict_forbid(),
        storage.is_locked()
    );

    handle_session(&storage, BufReader::new(stdin()), stdout(), &config.shell).await
}

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching RAX VFS shell...");

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}
