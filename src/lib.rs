pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::{Config, GeneralConfig};
pub use error::RegistrationError;
pub use services::{RegistrationBackend, SeaOrmRegistrationService, TokenStore};

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(general: &GeneralConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let json_layer = general.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!general.json_logs)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let args = Cli::parse();

    config.validate()?;

    match args.command {
        Commands::Init => cli::cmd_init(),
        Commands::AddUser(args) => cli::cmd_add_user(&config, args).await,
        Commands::Activate { token } => cli::cmd_activate(&config, &token).await,
        Commands::IssueToken { user_id } => cli::cmd_issue_token(&config, &user_id).await,
        Commands::VerifyToken { token } => cli::cmd_verify_token(&config, &token).await,
        Commands::PurgeTokens { user_id } => cli::cmd_purge_tokens(&config, &user_id).await,
        Commands::ShowUser { user, json } => cli::cmd_show_user(&config, &user, json).await,
        Commands::Login { username, password } => {
            cli::cmd_login(&config, &username, &password).await
        }
    }
}
