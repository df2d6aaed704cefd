//! medlink - drive one tab's session against the health backend.
//!
//! Usage: medlink [--tab <id>] <command>

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use medlink_lib::api::HttpHealthApi;
use medlink_lib::config::{self, ApiConfig};
use medlink_lib::models::{Credentials, ProviderRole, Role};
use medlink_lib::navigation::HistoryNavigator;
use medlink_lib::tab_storage::{FileTabStorage, TabStorage};
use medlink_lib::{ProviderState, SessionManager};

#[derive(Parser)]
#[command(name = "medlink")]
#[command(about = "Per-tab telehealth session client", version)]
struct Cli {
    /// Tab identity; each id keeps its own token
    #[arg(long, env = "MEDLINK_TAB_ID", default_value = "default", global = true)]
    tab: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print the profile
    Login {
        role: Role,
        identifier: String,
        #[arg(long, env = "MEDLINK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out this tab
    Logout,

    /// Print the signed-in profile
    Whoami,

    /// Check the signed-in user as a provider of the given role
    Provider { role: ProviderRole },

    /// List requests assigned to the signed-in provider
    Requests,
}

#[tokio::main]
async fn main() -> Result<()> {
    medlink_lib::init_tracing();
    let cli = Cli::parse();

    let api_config = ApiConfig::from_env().context("Invalid API configuration")?;
    let locale = config::locale_from_env()?;

    let storage: Arc<dyn TabStorage> = Arc::new(
        FileTabStorage::open(&config::tab_storage_dir(), cli.tab.as_str())
            .context("Failed to open tab storage")?,
    );
    let api = Arc::new(HttpHealthApi::new(&api_config, storage.clone())?);
    let navigator = Arc::new(HistoryNavigator::new());

    let manager = SessionManager::builder(api)
        .storage(storage)
        .navigator(navigator.clone())
        .locale(locale)
        .build();

    tracing::debug!(tab = %cli.tab, base_url = %api_config.base_url, "Session manager ready");

    match cli.command {
        Command::Login {
            role,
            identifier,
            password,
        } => {
            let credentials = Credentials::new(role, identifier, password);
            let session = manager.login(&credentials).await?;
            eprintln!("Signed in as {}", session.user.display_name());
            print_json(&session.user)?;
        }
        Command::Logout => manager.logout(),
        Command::Whoami => match manager.restore().await? {
            Some(user) => {
                eprintln!("Signed in as {}", user.display_name());
                print_json(&user)?;
            }
            None => bail!("Not signed in"),
        },
        Command::Provider { role } => match manager.get_provider(role).await {
            ProviderState::Found(provider) => print_json(&provider)?,
            ProviderState::Error(message) => bail!(message),
            ProviderState::Loading => bail!("Provider lookup did not complete"),
        },
        Command::Requests => {
            let records = manager.assigned_requests().await?;
            print_json(&records)?;
        }
    }

    if let Some(route) = navigator.current() {
        tracing::info!(route = %route, "Tab navigated");
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
