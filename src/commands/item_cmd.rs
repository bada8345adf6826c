//! Item and stats CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use uuid::Uuid;

use feira::config::Config;
use feira::models::{ShoppingItem, Unit};
use feira::notify::LogNotifier;
use feira::stores::{ItemPatch, ItemStore};

use super::{build_backend, load_session, resolve_list_id};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item to a list
    Add {
        /// Item name
        name: String,

        /// Quantity (whole for count-based units)
        #[arg(long, short, default_value_t = 1.0)]
        qty: f64,

        /// Unit: "unit" or "kg"
        #[arg(long, short, default_value = "unit")]
        unit: String,

        /// Unit price
        #[arg(long, short, default_value_t = 0.0)]
        price: f64,

        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Show the items of a list
    Ls {
        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Toggle an item between pending and bought
    Toggle {
        /// Item id
        id: Uuid,

        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Edit an item's fields
    Edit {
        /// Item id
        id: Uuid,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New quantity
        #[arg(long)]
        qty: Option<f64>,

        /// New unit: "unit" or "kg"
        #[arg(long)]
        unit: Option<String>,

        /// New unit price
        #[arg(long)]
        price: Option<f64>,

        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Remove an item
    Rm {
        /// Item id
        id: Uuid,

        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Remove every bought item
    ClearDone {
        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },

    /// Remove every item
    ClearAll {
        /// List id (defaults to the current list)
        #[arg(long)]
        list: Option<Uuid>,
    },
}

impl ItemCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let session = load_session(&config.session_path);
        let backend = build_backend(config, session.as_ref());
        let notifier = Arc::new(LogNotifier);
        let mut store = ItemStore::new(backend.clone(), notifier.clone());

        let explicit = match &self.command {
            ItemSubcommand::Add { list, .. }
            | ItemSubcommand::Ls { list }
            | ItemSubcommand::Toggle { list, .. }
            | ItemSubcommand::Edit { list, .. }
            | ItemSubcommand::Rm { list, .. }
            | ItemSubcommand::ClearDone { list }
            | ItemSubcommand::ClearAll { list } => *list,
        };
        let list_id =
            resolve_list_id(backend, notifier, session.as_ref(), explicit).await?;

        match &self.command {
            ItemSubcommand::Add {
                name,
                qty,
                unit,
                price,
                ..
            } => {
                let unit: Unit = unit.parse()?;
                let id = store
                    .add_item(session.as_ref(), list_id, name, *qty, unit, *price)
                    .await?;
                println!("Added item {}", id);
            }
            ItemSubcommand::Ls { .. } => {
                store.load_items(session.as_ref(), list_id).await?;

                if store.items().is_empty() {
                    println!("No items.");
                    return Ok(());
                }
                for item in store.items() {
                    println!("{}", format_item(item));
                }
            }
            ItemSubcommand::Toggle { id, .. } => {
                store.load_items(session.as_ref(), list_id).await?;
                let completed = store.toggle_item(*id).await?;
                println!(
                    "{}",
                    if completed { "Marked as bought" } else { "Unmarked" }
                );
            }
            ItemSubcommand::Edit {
                id,
                name,
                qty,
                unit,
                price,
                ..
            } => {
                let unit = match unit {
                    Some(u) => Some(u.parse::<Unit>()?),
                    None => None,
                };
                store.load_items(session.as_ref(), list_id).await?;
                store
                    .update_item(
                        *id,
                        ItemPatch {
                            name: name.clone(),
                            quantity: *qty,
                            unit,
                            price: *price,
                        },
                    )
                    .await?;
                println!("Updated item {}", id);
            }
            ItemSubcommand::Rm { id, .. } => {
                store.load_items(session.as_ref(), list_id).await?;
                store.remove_item(*id).await?;
                println!("Removed item {}", id);
            }
            ItemSubcommand::ClearDone { .. } => {
                store.load_items(session.as_ref(), list_id).await?;
                let removed = store.clear_completed().await?;
                println!("Removed {} bought item(s)", removed);
            }
            ItemSubcommand::ClearAll { .. } => {
                store.clear_all(session.as_ref(), list_id).await?;
                println!("Removed all items");
            }
        }

        Ok(())
    }
}

#[derive(Args)]
pub struct StatsCommand {
    /// List id (defaults to the current list)
    #[arg(long)]
    pub list: Option<Uuid>,
}

impl StatsCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let session = load_session(&config.session_path);
        let backend = build_backend(config, session.as_ref());
        let notifier = Arc::new(LogNotifier);

        let list_id =
            resolve_list_id(backend.clone(), notifier.clone(), session.as_ref(), self.list)
                .await?;

        let mut store = ItemStore::new(backend, notifier);
        store.load_items(session.as_ref(), list_id).await?;

        let stats = store.stats();
        println!("Items:  {} total, {} bought", stats.total_items, stats.completed_items);
        println!(
            "Value:  {:.2} total, {:.2} bought",
            stats.total_value, stats.completed_value
        );
        Ok(())
    }
}

fn format_item(item: &ShoppingItem) -> String {
    let check = if item.completed { "[x]" } else { "[ ]" };
    format!(
        "{} {}  {:<20} {} {}  @ {:.2}  = {:.2}",
        check,
        item.id,
        item.name,
        item.quantity,
        item.unit,
        item.price,
        item.line_total()
    )
}
