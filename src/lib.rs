//! sftp-bench - Upload throughput benchmark for SSH file-transfer clients
//!
//! Uploads every file in a local directory to a remote server through one of
//! two interchangeable transfer clients (SFTP subsystem or SCP sink) and
//! reports per-file throughput, so the same workload can be replayed against
//! the same server with either implementation.

pub mod bench;
pub mod config;
pub mod error;
pub mod transfer;

pub use bench::{RunSummary, TransferMetrics};
pub use config::{Backend, Config};
pub use error::{Error, Result};
pub use transfer::{ScpTransfer, SftpTransfer, TransferClient};
