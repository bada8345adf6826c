//! List management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use uuid::Uuid;

use feira::config::Config;
use feira::notify::LogNotifier;
use feira::stores::ListStore;

use super::{build_backend, load_session};

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// Show your lists and the lists shared with you
    Ls,

    /// Create a list and make it current
    Create {
        /// List name
        name: String,

        /// Optional description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Delete a list you own
    Delete {
        /// List id
        id: Uuid,
    },

    /// Share a list with another user by email
    Share {
        /// List id
        id: Uuid,

        /// Email of the user to share with
        email: String,
    },

    /// Revoke a user's access to a list
    Unshare {
        /// List id
        id: Uuid,

        /// Id of the user losing access
        user_id: Uuid,
    },
}

impl ListCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let session = load_session(&config.session_path);
        let backend = build_backend(config, session.as_ref());
        let mut store = ListStore::new(backend, Arc::new(LogNotifier));

        match &self.command {
            ListSubcommand::Ls => {
                store.load_lists(session.as_ref()).await?;

                if store.lists().is_empty() {
                    println!("No lists. Create one with `feira list create <name>`.");
                    return Ok(());
                }

                let current = store.current_list_id();
                for list in store.lists() {
                    let marker = if Some(list.id) == current { "*" } else { " " };
                    let tag = if list.shared { " (shared with you)" } else { "" };
                    match &list.description {
                        Some(description) => {
                            println!("{} {}  {} - {}{}", marker, list.id, list.name, description, tag)
                        }
                        None => println!("{} {}  {}{}", marker, list.id, list.name, tag),
                    }
                }
            }
            ListSubcommand::Create { name, description } => {
                let id = store
                    .create_list(session.as_ref(), name, description.as_deref())
                    .await?;
                println!("Created list {}", id);
            }
            ListSubcommand::Delete { id } => {
                store.load_lists(session.as_ref()).await?;
                store.delete_list(session.as_ref(), *id).await?;
                match store.current_list_id() {
                    Some(next) => println!("Deleted. Current list is now {}", next),
                    None => println!("Deleted. No lists left"),
                }
            }
            ListSubcommand::Share { id, email } => {
                store.share_list(session.as_ref(), *id, email).await?;
                println!("Shared {} with {}", id, email);
            }
            ListSubcommand::Unshare { id, user_id } => {
                store.unshare_list(session.as_ref(), *id, *user_id).await?;
                println!("Revoked access to {} for {}", id, user_id);
            }
        }

        Ok(())
    }
}
