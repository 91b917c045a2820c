//! SCP transfer client.
//!
//! Runs the remote `scp -t` sink over an exec channel and puts the whole
//! byte source through it in a single streaming call. One channel is opened
//! per file; the authenticated SSH session is reused for the whole run.
//!
//! Sink exchange per file:
//!
//! ```text
//! -> exec "scp -t <path>"
//! <- \0
//! -> "C0644 <len> <name>\n"
//! <- \0
//! -> <len> content bytes, then \0
//! <- \0
//! ```

use async_trait::async_trait;
use russh::{client, Channel, ChannelMsg};
use tokio::io::AsyncRead;
use tracing::debug;

use super::ssh::{self, ClientHandler};
use super::TransferClient;
use crate::config::Config;
use crate::error::{Error, Result};

pub struct ScpTransfer {
    session: Option<client::Handle<ClientHandler>>,
}

impl ScpTransfer {
    /// Connect and authenticate. Channels are opened lazily, one per file.
    pub async fn connect(config: &Config) -> Result<Self> {
        let handle = ssh::establish_session(config).await?;
        Ok(Self {
            session: Some(handle),
        })
    }
}

/// Command line for the remote sink, with the target single-quoted for the
/// remote shell.
fn sink_command(remote_path: &str) -> String {
    format!("scp -t {}", shell_quote(remote_path))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// SCP file header: mode, length, and base name, newline-terminated.
fn file_header(size: u64, remote_path: &str) -> String {
    let name = remote_path.rsplit('/').next().unwrap_or(remote_path);
    format!("C0644 {size} {name}\n")
}

/// Wait for the sink's one-byte acknowledgement. A nonzero status byte is
/// followed by an error message from the remote scp.
async fn read_ack(channel: &mut Channel<client::Msg>) -> Result<()> {
    loop {
        let Some(msg) = channel.wait().await else {
            return Err(Error::transfer("channel closed before scp acknowledgement"));
        };
        if let ChannelMsg::Data { data } = msg {
            match data.first() {
                Some(0) => return Ok(()),
                Some(_) => {
                    let message = String::from_utf8_lossy(&data[1..]).trim_end().to_string();
                    return Err(Error::transfer(format!("remote scp: {message}")));
                }
                None => {}
            }
        }
    }
}

/// Drain the channel after the final ack and surface a nonzero exit status.
async fn wait_close(channel: &mut Channel<client::Msg>) -> Result<()> {
    let mut exit_status = None;
    while let Some(msg) = channel.wait().await {
        if let ChannelMsg::ExitStatus { exit_status: code } = msg {
            exit_status = Some(code);
        }
    }
    match exit_status {
        Some(code) if code != 0 => Err(Error::transfer(format!(
            "remote scp exited with status {code}"
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl TransferClient for ScpTransfer {
    async fn send_file(
        &mut self,
        source: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        remote_path: &str,
    ) -> Result<u64> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::transfer("session is closed"))?;

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| Error::transfer(format!("failed to open SSH channel: {e}")))?;
        channel
            .exec(true, sink_command(remote_path))
            .await
            .map_err(|e| Error::transfer(format!("failed to start remote scp: {e}")))?;
        read_ack(&mut channel).await?;

        let header = file_header(size, remote_path);
        debug!(remote_path, header = header.trim_end(), "sending scp header");
        channel
            .data(header.as_bytes())
            .await
            .map_err(|e| Error::transfer(format!("failed to send scp header: {e}")))?;
        read_ack(&mut channel).await?;

        // Whole-stream put: the channel consumes the source to EOF.
        channel
            .data(source)
            .await
            .map_err(|e| Error::transfer(format!("failed to stream {remote_path}: {e}")))?;
        channel
            .data(&b"\0"[..])
            .await
            .map_err(|e| Error::transfer(format!("failed to terminate {remote_path}: {e}")))?;
        read_ack(&mut channel).await?;

        channel
            .eof()
            .await
            .map_err(|e| Error::transfer(format!("failed to close channel: {e}")))?;
        wait_close(&mut channel).await?;

        Ok(size)
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(handle) = self.session.take() {
            ssh::close_session(handle).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_command_quotes_target() {
        assert_eq!(sink_command("/incoming/a.txt"), "scp -t '/incoming/a.txt'");
        assert_eq!(
            sink_command("/tmp/it's here.txt"),
            r"scp -t '/tmp/it'\''s here.txt'"
        );
    }

    #[test]
    fn file_header_uses_base_name() {
        assert_eq!(file_header(100, "/incoming/a.txt"), "C0644 100 a.txt\n");
        assert_eq!(file_header(0, "b.txt"), "C0644 0 b.txt\n");
    }
}
