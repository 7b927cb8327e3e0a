//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "multideploy",
    about = "Batch contract deployment and transfer tool for EVM chains",
    version
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the endpoint catalog
    Endpoint {
        #[command(subcommand)]
        action: EndpointAction,
    },

    /// Deploy a contract-creation template N times
    Deploy {
        /// Endpoint name from the catalog
        #[arg(short, long)]
        endpoint: String,

        /// Number of transactions in the batch
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,

        /// Resume a partially completed batch from this attempt index
        #[arg(long, default_value_t = 0)]
        start: u32,

        /// File with contract-creation bytecode (hex); defaults to the
        /// built-in storage contract
        #[arg(long)]
        bytecode: Option<PathBuf>,

        /// Gas limit per transaction
        #[arg(long, default_value_t = 2_000_000)]
        gas_limit: u64,

        /// Environment variable holding the signing key
        #[arg(long, default_value = "MULTIDEPLOY_PRIVATE_KEY")]
        key_env: String,
    },

    /// Send plain ETH transfers N times
    Send {
        /// Endpoint name from the catalog
        #[arg(short, long)]
        endpoint: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount per transfer, in wei
        #[arg(long)]
        value_wei: String,

        /// Number of transfers in the batch
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Resume a partially completed batch from this attempt index
        #[arg(long, default_value_t = 0)]
        start: u32,

        /// Environment variable holding the signing key
        #[arg(long, default_value = "MULTIDEPLOY_PRIVATE_KEY")]
        key_env: String,
    },

    /// Ask the completion endpoint for deployment advice
    Ask {
        /// Prompt text
        prompt: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum EndpointAction {
    /// Add an endpoint to the catalog
    Add {
        name: String,
        #[arg(long)]
        rpc_url: String,
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        explorer: String,
    },

    /// Edit fields of an existing endpoint
    Edit {
        name: String,
        #[arg(long)]
        rpc_url: Option<String>,
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        explorer: Option<String>,
        /// New name for the endpoint
        #[arg(long)]
        rename: Option<String>,
    },

    /// Remove an endpoint by name
    Remove { name: String },

    /// List catalog entries
    List,
}
