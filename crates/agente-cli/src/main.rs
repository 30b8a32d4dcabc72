//! Agente CLI - a command-line client for the Agente MAWDSLEYS backend.
//!
//! Logs in against the dashboard API, keeps the session between runs, and
//! sends authenticated requests to any backend endpoint.

mod prompt;

use std::io;
use std::sync::Arc;

use agente_core::{AuthState, Config, Navigator, SessionStore};
use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: agente <command> [args]

Commands:
  login [email]          Log in (password from AGENTE_PASSWORD or prompt)
  signup <name> <email>  Create an account and log into it
  logout                 Forget the saved session
  whoami                 Show the logged-in user
  verify                 Check the saved token with the backend
  get <path>             GET an API path and print the JSON response
  post <path> <json>     POST a JSON body to an API path
  help                   Show this message

Environment:
  AGENTE_API_URL         Backend base URL (overrides config)
  AGENTE_EMAIL           Default login email
  AGENTE_PASSWORD        Login password
  RUST_LOG               Log filter (default: warn)";

/// Tells the user to log in again after the backend rejected the token
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate_to_login(&self) {
        eprintln!("Session expired. Run `agente login` to sign in again.");
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    if let Ok(url) = std::env::var("AGENTE_API_URL") {
        config.api_base_url = url;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = load_config()?;
    let storage = config.open_storage()?;
    let store = SessionStore::new(&config, storage, Arc::new(CliNavigator))?;
    let state = store.bootstrap();
    info!(?state, api = %config.api_base_url, "Agente CLI starting");

    match (command, &args[1..]) {
        ("login", rest) => {
            let email = match rest.first() {
                Some(email) => email.clone(),
                None => prompt::email(&config)?,
            };
            let password = prompt::password()?;
            let user = store.login(&email, &password).await?;
            config.last_email = Some(email);
            config.save().context("Failed to save config")?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        ("signup", [name, email, ..]) => {
            let password = prompt::password()?;
            let user = store.signup(name, email, &password).await?;
            config.last_email = Some(email.clone());
            config.save().context("Failed to save config")?;
            println!("Account created. Logged in as {} <{}>", user.name, user.email);
        }
        ("logout", _) => {
            store.logout();
            println!("Logged out");
        }
        ("whoami", _) => match store.user() {
            Some(user) => println!("{} <{}> (id {}, role {})", user.name, user.email, user.id, user.role),
            None => println!("Not logged in"),
        },
        ("verify", _) => {
            if state != AuthState::Authenticated {
                bail!("Not logged in");
            }
            if store.verify_token().await {
                println!("Token is valid");
            } else {
                bail!("Token was rejected; session cleared");
            }
        }
        ("get", [path, ..]) => {
            let body: serde_json::Value = store.api().get(path).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        ("post", [path, json, ..]) => {
            let payload: serde_json::Value =
                serde_json::from_str(json).context("Request body is not valid JSON")?;
            let body: serde_json::Value = store.api().post(path, &payload).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("Unknown command or missing arguments: {}", args.join(" "));
        }
    }

    Ok(())
}
