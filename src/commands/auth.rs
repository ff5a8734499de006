//! Account commands: sign up, sign in, sign out, password reset and status.

use clap::{Args, Subcommand};
use instaurant_core::{AccountHandle, SyncError};
use std::io::{self, Write};

use crate::app::App;
use crate::config::Config;
use crate::session::{SessionError, SessionFile};

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create a new owner account
    Signup {
        /// Account email
        email: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in to an existing account
    Signin {
        /// Account email
        email: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the saved session
    Signout,
    /// Send a password reset email
    Reset {
        /// Account email
        email: String,
    },
    /// Show the signed-in account
    Status,
}

impl AuthCommand {
    pub async fn run(&self, app: &App, config: &Config) -> Result<(), AuthError> {
        match &self.command {
            AuthSubcommand::Signup { email, password } => {
                let password = password_or_prompt(password.as_deref())?;
                let account = app.sync.create_account(email.trim(), &password).await?;
                save_session(config, account.clone())?;
                println!("Created account {} ({})", account.email, account.uid);
                Ok(())
            }
            AuthSubcommand::Signin { email, password } => {
                let password = password_or_prompt(password.as_deref())?;
                let account = app.sync.sign_in(email.trim(), &password).await?;
                save_session(config, account.clone())?;
                println!("Signed in as {}", account.email);
                Ok(())
            }
            AuthSubcommand::Signout => {
                if app.session.is_some() {
                    app.sync.sign_out().await?;
                }
                if SessionFile::clear(&config.session_path())? {
                    println!("Signed out.");
                } else {
                    println!("Not signed in.");
                }
                Ok(())
            }
            AuthSubcommand::Reset { email } => {
                app.sync.reset_password(email.trim()).await?;
                println!("Password reset email sent to {}", email.trim());
                Ok(())
            }
            AuthSubcommand::Status => {
                status(app.sync.current_account(), config);
                Ok(())
            }
        }
    }
}

fn save_session(config: &Config, account: AccountHandle) -> Result<(), AuthError> {
    let session = SessionFile::new(config.backend.value, account);
    session.save(&config.session_path())?;
    tracing::debug!(path = %config.session_path().display(), "saved session");
    Ok(())
}

fn status(account: Option<AccountHandle>, config: &Config) {
    println!("Backend: {}", config.backend.value);
    match account {
        Some(account) => {
            println!("Status: Signed in");
            println!("  Email: {}", account.email);
            println!("  Owner ID: {}", account.uid);
            if let Some(expires_at) = account.expires_at {
                let note = if account.is_expired() { " (expired)" } else { "" };
                println!("  Token expires: {}{}", expires_at.to_rfc3339(), note);
            }
        }
        None => {
            println!("Status: Not signed in");
            println!();
            println!("Run 'instaurant auth signin <EMAIL>' to sign in.");
        }
    }
}

fn password_or_prompt(password: Option<&str>) -> Result<String, AuthError> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim_end_matches(['\r', '\n']).to_string();
    if input.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    Ok(input)
}

/// Errors that can occur during authentication
#[derive(Debug)]
pub enum AuthError {
    /// I/O error
    IoError(io::Error),
    /// Rejected by the backend
    Backend(SyncError),
    /// Session file error
    Session(SessionError),
    /// No password was entered
    EmptyPassword,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::IoError(e) => write!(f, "I/O error: {}", e),
            AuthError::Backend(e) => write!(f, "{}", e),
            AuthError::Session(e) => write!(f, "{}", e),
            AuthError::EmptyPassword => write!(f, "Password cannot be empty"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::IoError(e)
    }
}

impl From<SyncError> for AuthError {
    fn from(e: SyncError) -> Self {
        AuthError::Backend(e)
    }
}

impl From<SessionError> for AuthError {
    fn from(e: SessionError) -> Self {
        AuthError::Session(e)
    }
}
