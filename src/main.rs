use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use sftp_bench::config::DEFAULT_PORT;
use sftp_bench::{bench, Backend, Config};

#[derive(Parser)]
#[command(name = "sftp-bench")]
#[command(about = "Upload throughput benchmark for SSH file-transfer clients")]
#[command(long_about = "sftp-bench - Uploads every file in a local directory to a remote \
server through a selectable transfer client and reports per-file throughput.

Clients:
  sftp - SFTP subsystem (explicit remote handle, chunked writes)
  scp  - SCP sink (single put of the whole stream)")]
#[command(after_help = "EXAMPLES:
    # Benchmark the SFTP client against a staging server
    sftp-bench --host staging.example.com --user bench --password secret \\
        --localdir ./corpus --remotedir /incoming --client sftp

    # Same workload through the SCP client on a nonstandard port
    sftp-bench --host 10.0.0.5 --port 2222 --user bench --password secret \\
        --localdir ./corpus --client scp
")]
struct Cli {
    /// Remote server hostname or IP address
    #[arg(long)]
    host: String,

    /// Remote SSH port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Username for password authentication
    #[arg(long)]
    user: String,

    /// Password for the user
    #[arg(long)]
    password: String,

    /// Local directory whose immediate files are uploaded
    #[arg(long)]
    localdir: PathBuf,

    /// Destination directory on the server (default: server's default directory)
    #[arg(long, default_value = "")]
    remotedir: String,

    /// Transfer client implementation: sftp or scp
    #[arg(long)]
    client: Backend,

    /// Bound in seconds on each connect/authenticate step
    #[arg(long, default_value_t = 4)]
    connect_timeout: u64,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            host: self.host,
            port: self.port,
            username: self.user,
            password: self.password,
            local_dir: self.localdir,
            remote_dir: self.remotedir,
            backend: self.client,
            connect_timeout: Duration::from_secs(self.connect_timeout),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let config = Cli::parse().into_config();
    println!("{config:?}");

    if let Err(e) = config.validate() {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(e.exit_code());
    }

    match bench::run(&config).await {
        Ok(summary) => {
            println!(
                "Uploaded {} file(s), {} in {:.3} s at {:.2} KB/s",
                summary.files,
                humansize::format_size(summary.bytes, humansize::BINARY),
                summary.elapsed.as_secs_f64(),
                summary.throughput_kbps()
            );
        }
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            std::process::exit(e.exit_code());
        }
    }
}
