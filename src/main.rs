use std::sync::Arc;

use tracing::{info, warn};

use seavault_tracker::logging::init_logging;
use seavault_tracker::{
  Config, ConsoleEventHandler, StaticAccountProvider, SuiRpcClient, TrackerOptions, VaultTracker,
};

fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  let config = Config::from_env()?;
  init_logging("seavault_tracker=info,warn", config.log_format)?;

  tokio::runtime::Runtime::new()?.block_on(async {
    info!("Initializing vault tracker v{}...", seavault_tracker::VERSION);
    info!("RPC URL: {}", config.rpc_url);
    info!("Vault package: {}", config.package_id);
    match &config.owner_address {
      Some(owner) => info!("Owner Address: {}", owner),
      None => warn!("OWNER_ADDRESS not set, the vault cannot be resolved"),
    }

    let client = Arc::new(SuiRpcClient::new(config.rpc_url.clone()));
    let session = Arc::new(StaticAccountProvider::new(config.owner_address.clone()));
    let handler = Arc::new(ConsoleEventHandler::new());

    let tracker = VaultTracker::start(client, session, handler, TrackerOptions::from(&config));

    let outcome = tracker.refresh_data().await?;
    if let Some(err) = &outcome.error {
      warn!("Initial load incomplete: {}", err);
    }

    info!("Vault tracker is running. Press Ctrl+C to stop.");

    // Keep the program running
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    tracker.shutdown();

    Ok(())
  })
}
