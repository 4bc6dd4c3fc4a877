use log::{debug, error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::client::Session;
use crate::config::ShellConfig;
use crate::error::VfsError;
use crate::protocol::responses::{OK, SYNTAX_ERROR, format_response};
use crate::protocol::{CommandStatus, handle_command, parse_command};
use crate::storage::Storage;

/// Runs a shell session until `QUIT` or end of input.
///
/// - Reads command lines from `reader`, one per line.
/// - Dispatches commands using `handle_command`.
/// - Writes every reply to `writer` and flushes it.
///
/// The storage is only borrowed, so several sessions may share one storage
/// as long as they run on the same thread.
pub async fn handle_session<R, W>(
    storage: &Storage,
    mut reader: R,
    mut writer: W,
    config: &ShellConfig,
) -> Result<(), VfsError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::new();
    let mut line = String::new();

    writer
        .write_all(format_response(OK, &config.greeting).as_bytes())
        .await?;

    loop {
        if !config.prompt.is_empty() {
            writer.write_all(config.prompt.as_bytes()).await?;
        }
        writer.flush().await?;

        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Session input closed");
                break;
            }
            Ok(_) => {
                // Enforce command length limit
                if line.len() > config.max_command_length {
                    writer
                        .write_all(format_response(SYNTAX_ERROR, "Command too long").as_bytes())
                        .await?;
                    continue;
                }

                let trimmed = line.trim_end_matches(['\r', '\n']);
                if trimmed.trim().is_empty() {
                    continue;
                }

                let command = parse_command(trimmed);
                debug!("Received: {:?}", &command);

                let result = handle_command(storage, &mut session, &command);
                if let Some(msg) = result.message {
                    writer.write_all(msg.as_bytes()).await?;
                }

                match result.status {
                    CommandStatus::CloseConnection => {
                        info!("Session ended by QUIT");
                        break;
                    }
                    CommandStatus::Failure(reason) => debug!("Command failed: {}", reason),
                    CommandStatus::Success => {}
                }
            }
            Err(e) => {
                error!("Failed to read command: {}", e);
                return Err(e.into());
            }
        }
    }

    writer.flush().await?;
    Ok(())
}
