//! `shardvisor` command line: runs a multi-shard dedicated server cluster.
//!
//! ```text
//! shardvisor --server ./bin/dontstarve_dedicated_server_nullrenderer \
//!            --persistent-storage-root ~/.klei --shard Master --shard Caves
//! ```
//!
//! Shard output goes to stdout, supervisor diagnostics to stderr
//! (`RUST_LOG` controls their verbosity).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use shardvisor::{
    CommandLauncher, Config, LaunchSpec, LogWriter, ServerArgs, ShardSet, Subscribe, Supervisor,
};

#[derive(Debug, Parser)]
#[command(version, about = "Runs the shards of a dedicated server cluster as one unit")]
struct Cli {
    /// Dedicated server executable.
    #[arg(long, value_name = "PATH")]
    server: PathBuf,

    /// Working directory of the shards [default: directory of the server executable].
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Shard to run; repeat for every shard, in start order.
    #[arg(long = "shard", value_name = "NAME", required = true)]
    shards: Vec<String>,

    /// Character that starts a shard-selection line on stdin.
    #[arg(long, default_value_t = ':')]
    selector: char,

    /// Directory containing the configuration directory.
    #[arg(long, value_name = "DIR")]
    persistent_storage_root: PathBuf,

    /// Name of the configuration directory.
    #[arg(long, default_value = "DoNotStarveTogether")]
    conf_dir: String,

    /// Name of the cluster directory.
    #[arg(long, default_value = "Cluster_1")]
    cluster: String,

    /// Start the shards in offline mode.
    #[arg(long)]
    offline: bool,

    /// Opt out of server data collection.
    #[arg(long)]
    disable_data_collection: bool,

    /// Address the shards listen on.
    #[arg(long, value_name = "ADDR")]
    bind_ip: Option<String>,

    /// Player cap (0 keeps the server default).
    #[arg(long, default_value_t = 0)]
    players: u32,

    /// Keep a backup of the previous log files.
    #[arg(long)]
    backup_logs: bool,

    /// Network tick rate (0 keeps the server default).
    #[arg(long, default_value_t = 0)]
    tick: u32,
}

impl Cli {
    fn server_args(&self) -> ServerArgs {
        ServerArgs {
            persistent_storage_root: self.persistent_storage_root.clone(),
            conf_dir: self.conf_dir.clone(),
            cluster: self.cluster.clone(),
            offline: self.offline,
            disable_data_collection: self.disable_data_collection,
            bind_ip: self.bind_ip.clone(),
            players: self.players,
            backup_logs: self.backup_logs,
            tick: self.tick,
            monitor_parent: Some(std::process::id()),
        }
    }

    fn launch_spec(&self) -> anyhow::Result<LaunchSpec> {
        let executable = std::path::absolute(&self.server)
            .with_context(|| format!("resolving server path {}", self.server.display()))?;
        let working_dir = match &self.workdir {
            Some(dir) => dir.clone(),
            None => parent_dir(&executable)?,
        };
        Ok(LaunchSpec {
            executable,
            working_dir,
            base_args: self.server_args().base_args(),
        })
    }
}

fn parent_dir(executable: &Path) -> anyhow::Result<PathBuf> {
    match executable.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => bail!("cannot derive a working directory from {}", executable.display()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let code = run(cli)?;
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let shards = ShardSet::new(cli.shards.iter().cloned())?;
    let spec = cli.launch_spec()?;
    let cfg = Config {
        selector: cli.selector,
        ..Config::default()
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let res = rt.block_on(async move {
        let launcher = CommandLauncher::new(spec).with_chunk(cfg.pump_buffer_clamped());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
        let sup = Supervisor::new(cfg, subs);

        let requests = sup.signal_requests();
        let input = BufReader::new(tokio::io::stdin());
        let code = sup
            .run_with(&launcher, &shards, Some(input), requests)
            .await?;
        anyhow::Ok(code)
    });

    // A blocked stdin read would otherwise keep the runtime alive.
    rt.shutdown_background();
    res
}
