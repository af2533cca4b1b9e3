//! Snyk group sync worker.

#![forbid(unsafe_code)]

mod worker_command;
mod worker_config;

use std::sync::Arc;

use snyk_sync_application::{SnykConnector, SyncRunner};
use snyk_sync_core::{AppError, AppResult};
use snyk_sync_domain::Grant;
use snyk_sync_infrastructure::HttpSnykClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use worker_command::{ProvisioningTarget, WorkerCommand};
use worker_config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = WorkerCommand::parse(std::env::args().skip(1))?;
    let config = WorkerConfig::load()?;
    let connector = build_connector(&config)?;

    let metadata = connector.metadata();
    info!(
        connector = %metadata.display_name,
        description = %metadata.description,
        group_id = %config.group_id,
        api_base_url = %config.api_base_url,
        org_filter_count = config.org_ids.len(),
        page_size = config.page_size,
        "snyk-sync-worker started"
    );

    run_until_interrupted(run(&connector, command), tokio::signal::ctrl_c()).await
}

/// Runs `operation` unless `interrupt` fires first.
///
/// A failure to listen for the interrupt is logged and the operation keeps
/// running to completion.
async fn run_until_interrupted<F, S>(operation: F, interrupt: S) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(operation);

    tokio::select! {
        result = &mut operation => result,
        signal = interrupt => match signal {
            Ok(()) => {
                warn!("interrupted, in-flight operation cancelled");
                Err(AppError::Internal("operation cancelled".to_owned()))
            }
            Err(error) => {
                warn!(error = %error, "failed to listen for interrupt signal");
                operation.await
            }
        },
    }
}

fn build_connector(config: &WorkerConfig) -> AppResult<SnykConnector> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let client = HttpSnykClient::new(
        http_client,
        config.api_base_url.clone(),
        config.api_token.clone(),
        config.group_id.as_str(),
    )?;

    Ok(SnykConnector::new(
        Arc::new(client),
        config.group_id.as_str(),
        config.org_ids.clone(),
        config.page_size,
    ))
}

async fn run(connector: &SnykConnector, command: WorkerCommand) -> AppResult<()> {
    connector.validate().await?;

    match command {
        WorkerCommand::Sync => sync(connector).await,
        WorkerCommand::Grant(target) => grant(connector, &target).await,
        WorkerCommand::Revoke(target) => revoke(connector, &target).await,
    }
}

async fn sync(connector: &SnykConnector) -> AppResult<()> {
    let snapshot = SyncRunner::new(connector.resource_syncers()).run().await?;
    let encoded = serde_json::to_string_pretty(&snapshot)
        .map_err(|error| AppError::Internal(format!("failed to encode sync snapshot: {error}")))?;
    println!("{encoded}");
    Ok(())
}

async fn grant(connector: &SnykConnector, target: &ProvisioningTarget) -> AppResult<()> {
    connector
        .organizations()
        .grant(&target.principal(), &target.entitlement())
        .await?;
    info!(
        org_id = %target.org_id,
        user_id = %target.user_id,
        slug = %target.slug,
        "grant applied"
    );
    Ok(())
}

async fn revoke(connector: &SnykConnector, target: &ProvisioningTarget) -> AppResult<()> {
    let grant = Grant::new(target.entitlement(), target.principal());
    connector.organizations().revoke(&grant).await?;
    info!(
        org_id = %target.org_id,
        user_id = %target.user_id,
        slug = %target.slug,
        "revoke applied"
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
