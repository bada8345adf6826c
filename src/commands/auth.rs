//! Auth CLI commands: session sign-in/sign-up/sign-out.

use clap::{Args, Subcommand};

use feira::config::Config;
use feira::session::SessionClient;

use super::{clear_session, load_session, save_session};

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, short)]
        password: String,
    },

    /// Create an account and sign in
    Signup {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, short)]
        password: String,

        /// Display name for the profile
        #[arg(long, short)]
        name: String,
    },

    /// Drop the cached session and revoke the token
    Logout,

    /// Show who is signed in
    Whoami,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = SessionClient::new(config.server_url.clone(), config.anon_key.clone());

        match &self.command {
            AuthSubcommand::Login { email, password } => {
                let session = client.sign_in(email, password).await?;
                save_session(&config.session_path, &session)?;
                println!("Signed in as {}", session.user.email);
            }
            AuthSubcommand::Signup {
                email,
                password,
                name,
            } => {
                let session = client.sign_up(email, password, name).await?;
                save_session(&config.session_path, &session)?;
                println!("Account created. Signed in as {}", session.user.email);
            }
            AuthSubcommand::Logout => {
                if let Some(session) = load_session(&config.session_path) {
                    if let Err(e) = client.sign_out(&session).await {
                        tracing::warn!("server-side sign-out failed: {}", e);
                    }
                }
                clear_session(&config.session_path)?;
                println!("Signed out");
            }
            AuthSubcommand::Whoami => match load_session(&config.session_path) {
                Some(session) => {
                    // Validate the token is still live, not just cached.
                    let user = client.current_user(&session.access_token).await?;
                    println!("{} ({})", user.email, user.id);
                }
                None => println!("Not signed in"),
            },
        }

        Ok(())
    }
}
