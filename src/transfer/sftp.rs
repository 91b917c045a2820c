//! SFTP transfer client.
//!
//! Uses the SFTP subsystem over an SSH channel: the remote file is opened
//! as an explicit handle and written in 32 KiB chunks at monotonically
//! increasing offsets, then closed once the source is exhausted.

use async_trait::async_trait;
use russh::client;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use super::ssh::{self, ClientHandler};
use super::{TransferClient, CHUNK_SIZE};
use crate::config::Config;
use crate::error::{Error, Result};

pub struct SftpTransfer {
    session: Option<client::Handle<ClientHandler>>,
    sftp: Option<SftpSession>,
}

impl SftpTransfer {
    /// Connect, authenticate, and start the SFTP subsystem.
    pub async fn connect(config: &Config) -> Result<Self> {
        let handle = ssh::establish_session(config).await?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| Error::connection(format!("failed to open SSH channel: {e}")))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| Error::connection(format!("failed to start SFTP subsystem: {e}")))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::connection(format!("failed to create SFTP session: {e}")))?;

        debug!("SFTP session established");
        Ok(Self {
            session: Some(handle),
            sftp: Some(sftp),
        })
    }
}

#[async_trait]
impl TransferClient for SftpTransfer {
    async fn send_file(
        &mut self,
        source: &mut (dyn AsyncRead + Send + Unpin),
        _size: u64,
        remote_path: &str,
    ) -> Result<u64> {
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| Error::transfer("session is closed"))?;

        let mut remote = sftp
            .create(remote_path)
            .await
            .map_err(|e| Error::transfer(format!("failed to create {remote_path}: {e}")))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = source
                .read(&mut buf)
                .await
                .map_err(|e| Error::transfer(format!("failed to read source: {e}")))?;
            if n == 0 {
                break;
            }
            remote.write_all(&buf[..n]).await.map_err(|e| {
                Error::transfer(format!(
                    "failed to write {remote_path} at offset {written}: {e}"
                ))
            })?;
            written += n as u64;
        }

        remote
            .shutdown()
            .await
            .map_err(|e| Error::transfer(format!("failed to close {remote_path}: {e}")))?;

        debug!(remote_path, written, "remote handle closed");
        Ok(written)
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Dropping the SFTP session closes its channel before the SSH
        // session goes away.
        self.sftp.take();
        if let Some(handle) = self.session.take() {
            ssh::close_session(handle).await;
        }
        Ok(())
    }
}
