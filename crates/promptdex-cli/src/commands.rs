//! Command implementations.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use promptdex_core::api::{ApiClient, Method, RequestAuthenticator};
use promptdex_core::auth::{
    AuthService, CompletionOutcome, ExternalLoginCompletion, GateDecision, NoticeLevel, SessionGate,
    SessionStore,
};
use promptdex_core::config::Config;
use promptdex_core::AppKind;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{Command, USAGE};

/// Build the session stack once, rehydrate, then dispatch.
pub async fn run(app: AppKind, command: Command) -> Result<()> {
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    let storage = config.open_storage(app)?;
    let store = SessionStore::new(app, storage);

    let restored = store.rehydrate();
    debug!(restored, "Session rehydrated");

    let api = ApiClient::from_config(&config, RequestAuthenticator::new(store.clone()))?;
    let auth = AuthService::new(store.clone(), api);

    match command {
        Command::Login { username } => login(&auth, &mut config, username).await,
        Command::Register { username, email } => register(&auth, &username, &email).await,
        Command::Logout => {
            auth.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::WhoAmI => print_json(&store.current_session()),
        Command::Open { path } => open(&store, &path),
        Command::CompleteLogin { url } => complete_login(&store, &url),
        Command::Get { path } => {
            let body = auth
                .api()
                .request_value(Method::GET, &path, None)
                .await
                .with_context(|| format!("GET {} failed", path))?;
            print_json(&body)
        }
        Command::Help => Ok(()),
    }
}

async fn login(auth: &AuthService, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt_username()?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))?;

    match auth.login(&username, &password).await {
        Ok(session) => {
            config.last_username = Some(username.clone());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to remember username");
            }
            println!("Logged in as {}.", session.username().unwrap_or(&username));
            Ok(())
        }
        Err(e) => bail!("{}", e.user_message()),
    }
}

async fn register(auth: &AuthService, username: &str, email: &str) -> Result<()> {
    if !auth.supports_registration() {
        bail!("Registration is not available in the admin application");
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let notice = auth
        .register(username, &password, email)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", notice.message);
    Ok(())
}

fn open(store: &SessionStore, path: &str) -> Result<()> {
    match SessionGate::new(store.app()).guard(store, path) {
        GateDecision::Open => {
            println!("{}: open", path);
            Ok(())
        }
        GateDecision::Closed { redirect } => {
            bail!("{}: login required, redirecting to {}", path, redirect.to)
        }
    }
}

fn complete_login(store: &SessionStore, url: &str) -> Result<()> {
    let outcome = ExternalLoginCompletion::from_url(url).complete(store);

    println!("-> {}", outcome.navigation.to);
    check_completion(&outcome)
}

/// The landing itself decides success; an earlier session does not count
fn check_completion(outcome: &CompletionOutcome) -> Result<()> {
    match &outcome.notice {
        Some(notice) if notice.level == NoticeLevel::Error => bail!("{}", notice.message),
        Some(notice) => {
            println!("{}", notice.message);
            Ok(())
        }
        None if outcome.authenticated => Ok(()),
        None => bail!("External login did not complete"),
    }
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
