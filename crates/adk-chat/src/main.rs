use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use adk_chat::{config::Config, repl};
use adk_client::{AdkClient, AgentClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(
        "Connecting to {} (app {}, user {}, session {})",
        config.agent.api_base_url,
        config.agent.app_name,
        config.agent.user_id,
        config.agent.session_id
    );

    let client: Arc<dyn AgentClient> = Arc::new(AdkClient::new(config.agent.clone())?);

    let session = client
        .create_or_get_session()
        .await
        .context("Failed to create or get session")?;

    let mut stdout = std::io::stdout();
    repl::render_session(&session, &mut stdout)?;
    println!("Type a message, /session, /apps or /quit.");

    let stdin = BufReader::new(tokio::io::stdin());
    repl::run(client, stdin, stdout).await?;

    tracing::info!("Bye");
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stderr keeps logs out of the streamed reply
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
