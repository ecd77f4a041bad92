//! # Server command line.
//!
//! [`ServerArgs`] holds the launch options shared by every shard of a cluster
//! and renders them as the dedicated server's base argument list. Each shard
//! is then started with the base arguments plus `-shard <name>`.
//!
//! ## Sentinel values
//! - `players = 0` → flag omitted (server default)
//! - `tick = 0` → flag omitted (server default)
//! - `bind_ip = None` → flag omitted

use std::path::PathBuf;

/// Options shared by all shards of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerArgs {
    /// Directory containing the configuration directory.
    pub persistent_storage_root: PathBuf,
    /// Name of the configuration directory.
    pub conf_dir: String,
    /// Name of the cluster directory.
    pub cluster: String,
    /// Start in offline mode.
    pub offline: bool,
    /// Opt out of data collection.
    pub disable_data_collection: bool,
    /// Address to listen on for player connections.
    pub bind_ip: Option<String>,
    /// Player cap (`0` = server default).
    pub players: u32,
    /// Keep a backup of the previous log files.
    pub backup_logs: bool,
    /// Network tick rate (`0` = server default).
    pub tick: u32,
    /// Pid the shards should watch; they stop when it goes away.
    pub monitor_parent: Option<u32>,
}

impl ServerArgs {
    /// Base arguments common to every shard.
    pub fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-persistent_storage_root".to_string(),
            self.persistent_storage_root.display().to_string(),
            "-conf_dir".to_string(),
            self.conf_dir.clone(),
            "-cluster".to_string(),
            self.cluster.clone(),
        ];
        if self.offline {
            args.push("-offline".into());
        }
        if self.disable_data_collection {
            args.push("-disabledatacollection".into());
        }
        if let Some(ip) = self.bind_ip.as_deref().filter(|ip| !ip.is_empty()) {
            args.push("-bind_ip".into());
            args.push(ip.to_string());
        }
        if self.players > 0 {
            args.push("-players".into());
            args.push(self.players.to_string());
        }
        if self.backup_logs {
            args.push("-backup_logs".into());
        }
        if self.tick > 0 {
            args.push("-tick".into());
            args.push(self.tick.to_string());
        }
        if let Some(pid) = self.monitor_parent {
            args.push("-monitor_parent_process".into());
            args.push(pid.to_string());
        }
        args
    }
}

/// Full argument list for one shard: `base` followed by `-shard <name>`.
pub fn shard_args(base: &[String], shard: &str) -> Vec<String> {
    let mut args = Vec::with_capacity(base.len() + 2);
    args.extend_from_slice(base);
    args.push("-shard".into());
    args.push(shard.to_string());
    args
}
