use async_trait::async_trait;
use tokio::io::AsyncRead;

pub mod scp;
pub mod sftp;
mod ssh;

pub use scp::ScpTransfer;
pub use sftp::SftpTransfer;

use crate::config::{Backend, Config};
use crate::error::Result;

/// Buffer size for chunked remote writes.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// A connected, authenticated transfer client.
///
/// Both implementations satisfy the same contract: `send_file` fully
/// consumes the byte source and leaves a byte-identical file at
/// `remote_path` on the server; `disconnect` releases the session and is
/// safe to call on an already-closed client.
#[async_trait]
pub trait TransferClient: Send {
    /// Transmit the entire source to `remote_path`, creating or truncating
    /// the remote file. `size` is the source length known up front; the SCP
    /// sink protocol requires it in the file header. Returns bytes written.
    async fn send_file(
        &mut self,
        source: &mut (dyn AsyncRead + Send + Unpin),
        size: u64,
        remote_path: &str,
    ) -> Result<u64>;

    /// Release the session. Idempotent; never fails on a closed client.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Connect the transfer client selected by `config.backend`.
pub async fn connect(config: &Config) -> Result<Box<dyn TransferClient>> {
    match config.backend {
        Backend::Sftp => Ok(Box::new(SftpTransfer::connect(config).await?)),
        Backend::Scp => Ok(Box::new(ScpTransfer::connect(config).await?)),
    }
}
