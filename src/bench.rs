//! Upload driver and throughput instrumentation.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncRead, BufReader, ReadBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::transfer::{self, TransferClient};

/// Per-file measurement, computed after the transfer completes.
#[derive(Debug, Clone, Copy)]
pub struct TransferMetrics {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferMetrics {
    /// Throughput in KB/s. Zero-byte files and zero elapsed time report
    /// 0.0 rather than dividing by a near-zero duration.
    pub fn throughput_kbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if self.bytes == 0 || secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs / 1024.0
    }
}

/// Run-level totals across all uploaded files.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub files: usize,
    pub bytes: u64,
    /// Sum of per-file transfer times.
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, metrics: &TransferMetrics) {
        self.files += 1;
        self.bytes += metrics.bytes;
        self.elapsed += metrics.elapsed;
    }

    pub fn throughput_kbps(&self) -> f64 {
        TransferMetrics {
            bytes: self.bytes,
            elapsed: self.elapsed,
        }
        .throughput_kbps()
    }
}

/// Counting reader that drives a progress bar as the backend consumes the
/// source.
struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
    read: u64,
}

impl<R> ProgressReader<R> {
    fn new(inner: R, bar: ProgressBar) -> Self {
        Self {
            inner,
            bar,
            read: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let me = self.get_mut();
        let before = buf.filled().len();
        match Pin::new(&mut me.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                me.read += (buf.filled().len() - before) as u64;
                me.bar.set_position(me.read);
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

fn transfer_bar(file_name: &str, size: u64) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar.set_message(file_name.to_string());
    bar
}

/// Upload every immediate file in `config.local_dir` through `client`, one
/// at a time in listing order. Subdirectories are ignored. The first failed
/// transfer aborts the run; remaining files are not attempted.
pub async fn upload_dir(
    client: &mut dyn TransferClient,
    config: &Config,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    let mut entries = tokio::fs::read_dir(&config.local_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let size = metadata.len();
        let remote_path = config.remote_path_for(&file_name);
        println!("Uploading {file_name} -> {remote_path}");

        let file = tokio::fs::File::open(entry.path()).await?;
        let bar = transfer_bar(&file_name, size);
        let mut source = ProgressReader::new(BufReader::new(file), bar.clone());

        let start = Instant::now();
        let result = client.send_file(&mut source, size, &remote_path).await;
        let elapsed = start.elapsed();
        bar.finish_and_clear();

        let metrics = TransferMetrics {
            bytes: result?,
            elapsed,
        };
        println!(
            "Sent {} bytes in {:.3} s at {:.2} KB/s",
            metrics.bytes,
            metrics.elapsed.as_secs_f64(),
            metrics.throughput_kbps()
        );
        summary.record(&metrics);
    }

    Ok(summary)
}

/// Full benchmark run: connect the selected client, upload the directory,
/// and release the session on every exit path once it was acquired.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let mut client = transfer::connect(config).await?;
    let result = upload_dir(client.as_mut(), config).await;
    if let Err(e) = client.disconnect().await {
        warn!(error = %e, "disconnect failed");
    }
    result
}
