use clap::{ArgAction, Parser, Subcommand};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use hookwise::config::HookwiseConfig;
use hookwise::integrations::webhooks::{
    start_server, AppState, EventRouter, HandlerError, WebhookEndpoint, WebhookEvent,
};
use hookwise::integrations::IntegrationRegistry;
use hookwise::logging::{init_logging, LoggingConfig};
use hookwise::secrets::EnvSecretStore;

#[derive(Parser, Debug)]
#[command(name = "hookwise")]
#[command(version)]
#[command(about = "Classify third-party API errors and receive their webhooks")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Port to listen on (overrides configuration)
        #[arg(long, short)]
        port: Option<u16>,

        /// Address to bind to (overrides configuration)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Classify a raw upstream error and print it as JSON
    Classify {
        /// Integration whose table to use
        #[arg(long, short)]
        integration: String,

        /// Raw error as JSON; read from stdin when omitted
        error: Option<String>,
    },

    /// Print the header a genuine delivery of a payload would carry
    Sign {
        /// Integration whose webhook scheme to use
        #[arg(long, short)]
        integration: String,

        /// Webhook secret (defaults to the configured one)
        #[arg(long, short)]
        secret: Option<String>,

        /// File holding the payload; read from stdin when omitted
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = HookwiseConfig::load_or_default(cli.config.as_deref())?;
    init_logging(LoggingConfig::from_settings(&config.logging, cli.verbose));

    let mut registry = IntegrationRegistry::with_builtins()?;
    registry.apply_config(&config)?;

    match cli.command {
        Commands::Serve { port, bind } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(bind) = bind {
                server.bind_address = bind;
            }

            let state = build_state(&registry, &config);
            tracing::info!(integrations = ?state.integrations(), "Starting webhook server");
            start_server(state, &server.socket_addr()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Classify { integration, error } => {
            let Some(integration) = registry.get(&integration) else {
                eprintln!("Unknown integration: {}", integration);
                return Ok(ExitCode::FAILURE);
            };

            let input = match error {
                Some(error) => error,
                None => read_stdin()?,
            };
            let raw: serde_json::Value = serde_json::from_str(&input)?;

            let classified = integration.classify(raw);
            println!("{}", serde_json::to_string_pretty(&classified.to_log_json())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sign {
            integration,
            secret,
            file,
        } => {
            let Some(found) = registry.get(&integration) else {
                eprintln!("Unknown integration: {}", integration);
                return Ok(ExitCode::FAILURE);
            };

            let Some(secret) = secret.or_else(|| config.webhook_secret(&integration, &EnvSecretStore))
            else {
                eprintln!("No webhook secret configured for {}", integration);
                return Ok(ExitCode::FAILURE);
            };

            let Some(verifier) = found.verifier(secret) else {
                eprintln!("Integration {} does not receive webhooks", integration);
                return Ok(ExitCode::FAILURE);
            };

            let payload = match file {
                Some(path) => std::fs::read(path)?,
                None => read_stdin()?.into_bytes(),
            };

            println!("{}: {}", verifier.header(), verifier.compute_signature(&payload));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_stdin() -> std::io::Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// One endpoint per webhook-capable integration, logging each configured event type.
fn build_state(registry: &IntegrationRegistry, config: &HookwiseConfig) -> AppState {
    let mut endpoints = HashMap::new();

    for integration in registry.iter() {
        if integration.webhook().is_none() {
            continue;
        }
        let name = integration.name().to_string();

        let verifier = config
            .webhook_secret(&name, &EnvSecretStore)
            .and_then(|secret| integration.verifier(secret));
        if verifier.is_none() {
            tracing::warn!(integration = %name, "No webhook secret configured");
        }

        let mut router = EventRouter::new();
        for event_type in config.events(&name) {
            let integration = name.clone();
            router.on(event_type.clone(), move |event: WebhookEvent| {
                let integration = integration.clone();
                async move {
                    tracing::info!(
                        integration = %integration,
                        event_type = %event.event_type,
                        event_id = %event.id,
                        data = %event.data,
                        "Handled webhook event"
                    );
                    Ok::<(), HandlerError>(())
                }
            });
        }

        endpoints.insert(name, WebhookEndpoint::new(verifier, router));
    }

    AppState::new(endpoints)
}
