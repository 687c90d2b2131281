//! Command implementations.

mod auth;
mod bots;
mod feedback;
mod knowledge;

use std::sync::Arc;

use tokio::sync::broadcast::Receiver;
use tracing::debug;

use botdesk_client::{ApiClient, ClientConfig, ClientError, SessionEvent, SessionManager};
use botdesk_persistence::{paths, FileStore};
use botdesk_runtime::PollerConfig;

use crate::cli::{Cli, Commands, OutputFormat};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Everything a command needs to talk to the backend.
pub struct Context {
    pub client: ApiClient,
    pub format: OutputFormat,
    pub poller: PollerConfig,
}

/// Execute a CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let state_dir = cli.state_dir();
    let store = FileStore::new(paths::session_file(&state_dir));
    debug!(path = %store.path().display(), "using session store");
    let session = SessionManager::new(Arc::new(store));
    let mut session_events = session.subscribe();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
    }
    let client = ApiClient::new(config, session)?;

    let ctx = Context {
        client,
        format: cli.format,
        poller: PollerConfig::from_env()?,
    };

    let result = match cli.command {
        Commands::Login { email, password } => auth::cmd_login(&ctx, email, password).await,
        Commands::Register {
            email,
            name,
            password,
        } => auth::cmd_register(&ctx, email, name, password).await,
        Commands::VerifyEmail { token } => auth::cmd_verify_email(&ctx, &token).await,
        Commands::GoogleAuth { code } => auth::cmd_google_auth(&ctx, &code).await,
        Commands::Whoami => auth::cmd_whoami(&ctx).await,
        Commands::Logout => auth::cmd_logout(&ctx),
        Commands::Bots(command) => bots::execute(&ctx, command).await,
        Commands::Knowledge(command) => knowledge::execute(&ctx, command).await,
        Commands::Feedback(command) => feedback::execute(&ctx, command).await,
    };

    if let Err(e) = &result {
        if login_required(&mut session_events, e.as_ref()) {
            eprintln!("Session expired. Run `botdesk login` to sign in again.");
        }
    }
    result
}

/// Returns true if the failed command left the user logged out.
fn login_required(
    events: &mut Receiver<SessionEvent>,
    error: &(dyn std::error::Error + 'static),
) -> bool {
    let expired = std::iter::from_fn(|| events.try_recv().ok())
        .any(|event| matches!(event, SessionEvent::LoginRequired { .. }));
    expired
        || error
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::requires_login)
}

/// Masks a secret for display, keeping only the last four characters.
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(8), tail)
}
