//! Main entry point for the mercato status engine service.
//!
//! This binary wires the pluggable infrastructure implementations into the
//! status engine and serves the HTTP API consumed by the admin, vendor and
//! delivery-staff consoles.

use clap::Parser;
use mercato_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the mercato service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/demo.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the mercato service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the status engine with all implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started mercato status engine");

	// Load configuration
	let config_path = args.config.to_str().ok_or("Config path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.platform.id);

	let api_config = match &config.api {
		Some(api) if api.enabled => api.clone(),
		_ => {
			return Err(
				"The [api] section must be present and enabled; the engine is only reachable over HTTP"
					.into(),
			);
		},
	};

	// Build the engine with the registered implementations
	let engine = factory_registry::build_engine_from_config(config)?;
	let engine = Arc::new(engine);

	tokio::select! {
		result = server::start_server(api_config, engine) => {
			tracing::info!("API server finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Stopped mercato status engine");
	Ok(())
}
