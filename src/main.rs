//! multideploy - batch contract deployment and transfer tool for EVM chains
//!
//! Maintains a JSON catalog of blockchain endpoints and submits batches of
//! signed transactions against one of them, printing an explorer link per
//! confirmed transaction and a gas summary at the end.

use anyhow::{anyhow, Result};
use clap::Parser;
use ethers::types::U256;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

mod ai;
mod chain;
mod cli;
mod config;
mod endpoints;
mod error;
mod tx;

use ai::AiClient;
use chain::ChainProvider;
use cli::{Cli, Command, EndpointAction};
use config::Settings;
use endpoints::{EndpointConfig, EndpointStore};
use tx::{BatchSubmitter, ChannelSink, SubmissionReport, TxTemplate};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let store = EndpointStore::new(settings.store.path.clone());

    match cli.command {
        Command::Endpoint { action } => handle_endpoint(&store, action),
        Command::Deploy {
            endpoint,
            count,
            start,
            bytecode,
            gas_limit,
            key_env,
        } => {
            let template = match bytecode {
                Some(path) => {
                    let hex = std::fs::read_to_string(&path)
                        .map_err(|e| anyhow!("Failed to read bytecode file {:?}: {}", path, e))?;
                    TxTemplate::contract_creation(&hex, gas_limit, U256::zero())?
                }
                None => TxTemplate::storage_contract()?,
            };
            run_batch(&settings, &store, &endpoint, template, count, start, &key_env).await
        }
        Command::Send {
            endpoint,
            to,
            value_wei,
            count,
            start,
            key_env,
        } => {
            let value = U256::from_dec_str(&value_wei)
                .map_err(|e| anyhow!("Invalid wei amount '{}': {}", value_wei, e))?;
            let template = TxTemplate::transfer(&to, value)?;
            run_batch(&settings, &store, &endpoint, template, count, start, &key_env).await
        }
        Command::Ask { prompt } => {
            let client = AiClient::from_env(settings.ai)?;
            let answer = client.complete(&prompt).await?;
            println!("{}", answer);
            Ok(())
        }
    }
}

fn handle_endpoint(store: &EndpointStore, action: EndpointAction) -> Result<()> {
    match action {
        EndpointAction::Add {
            name,
            rpc_url,
            chain_id,
            explorer,
        } => {
            store.add(EndpointConfig {
                name: name.clone(),
                rpc_url,
                chain_id,
                explorer,
            })?;
            println!("Added endpoint '{}'", name);
        }
        EndpointAction::Edit {
            name,
            rpc_url,
            chain_id,
            explorer,
            rename,
        } => {
            let current = store.get(&name)?;
            let updated = EndpointConfig {
                name: rename.unwrap_or_else(|| current.name.clone()),
                rpc_url: rpc_url.unwrap_or(current.rpc_url),
                chain_id: chain_id.unwrap_or(current.chain_id),
                explorer: explorer.unwrap_or(current.explorer),
            };
            let new_name = updated.name.clone();
            store.update(&name, updated)?;
            println!("Updated endpoint '{}'", new_name);
        }
        EndpointAction::Remove { name } => {
            store.remove(&name)?;
            println!("Removed endpoint '{}' (if it existed)", name);
        }
        EndpointAction::List => {
            let endpoints = store.load()?;
            if endpoints.is_empty() {
                println!("No endpoints configured");
            }
            for e in endpoints {
                println!(
                    "{}\tchain {}\t{}\t{}",
                    e.name, e.chain_id, e.rpc_url, e.explorer
                );
            }
        }
    }
    Ok(())
}

async fn run_batch(
    settings: &Settings,
    store: &EndpointStore,
    endpoint_name: &str,
    template: TxTemplate,
    count: u32,
    start: u32,
    key_env: &str,
) -> Result<()> {
    let endpoint = store.get(endpoint_name)?;
    let private_key = std::env::var(key_env)
        .map_err(|_| anyhow!("Environment variable {} is not set", key_env))?;

    let provider =
        ChainProvider::connect(&endpoint, settings.submitter.gas_price_strategy).await?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let submitter = BatchSubmitter::new(
        Arc::new(provider),
        endpoint.clone(),
        &private_key,
        settings.submitter.clone(),
        cancel_rx,
    )?;

    info!(
        "Submitting {} {} transactions to {} as {:?}",
        count.saturating_sub(start),
        template.kind(),
        endpoint.name,
        submitter.sender_address()
    );

    // Ctrl+C cancels the in-flight run instead of killing the process
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling batch");
            let _ = cancel_tx.send(true);
        }
    });

    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let run_handle = tokio::spawn(async move {
        let sink = ChannelSink::new(report_tx);
        submitter.run(&template, count, start, &sink).await
    });

    while let Some(report) = report_rx.recv().await {
        match report {
            SubmissionReport::Submitted { index, tx_hash, .. } => {
                info!("Tx {} submitted: {}", index + 1, tx_hash);
            }
            SubmissionReport::Confirmed {
                index,
                gas_used,
                explorer_link,
                ..
            } => {
                println!("Tx {} confirmed ({} gas): {}", index + 1, gas_used, explorer_link);
            }
            SubmissionReport::Failed { index, error } => {
                error!("Tx {} failed: {}", index + 1, error);
            }
            SubmissionReport::Completed {
                confirmed,
                total_gas,
                next_nonce,
                ..
            } => {
                println!(
                    "Done: {} confirmed, total gas used: {} (next nonce: {})",
                    confirmed, total_gas, next_nonce
                );
            }
        }
    }

    match run_handle.await? {
        Ok(outcome) => {
            info!(
                "Batch finished: {} confirmed, {} gas",
                outcome.confirmed, outcome.total_gas
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,multideploy=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
