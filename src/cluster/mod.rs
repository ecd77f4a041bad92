//! Cluster description handed to the supervisor: which shards to start and
//! with which server arguments.

mod args;
mod shards;

pub use args::{ServerArgs, shard_args};
pub use shards::ShardSet;
