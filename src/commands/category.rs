use clap::{Args, Subcommand};
use instaurant_core::{Category, NewCategory};

use super::{confirm, find_record, OutputFormat};
use crate::app::App;

#[derive(Args)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// List the menu's categories in display order
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Append a category to the menu
    Add {
        /// Name of the category
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category ID or name
        identifier: String,

        /// New name
        name: String,
    },

    /// Delete a category and close the gap in the ordering
    Delete {
        /// Category ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl CategoryCommand {
    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        let owner = app.owner_id()?;
        app.sync.fetch_if_needed::<Category>(owner).await?;
        let state = app.sync.store().state();
        let categories = state.collection::<Category>(owner);

        match &self.command {
            CategorySubcommand::List { format } => {
                let ordered = categories.map(|c| c.ordered()).unwrap_or_default();

                if ordered.is_empty() {
                    println!("No categories found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&ordered)?);
                    }
                    OutputFormat::Text => {
                        for category in &ordered {
                            println!("{}", category);
                        }
                        println!("\nTotal: {} category(ies)", ordered.len());
                    }
                }
                Ok(())
            }

            CategorySubcommand::Add { name } => {
                if name.trim().is_empty() {
                    return Err("Category name cannot be empty".into());
                }

                let order = categories.map(|c| c.next_order()).unwrap_or(0);
                let created = app
                    .sync
                    .add_item::<Category>(owner, &NewCategory::new(name.trim(), order))
                    .await?;
                println!("Created category:");
                println!("{}", created);
                Ok(())
            }

            CategorySubcommand::Rename { identifier, name } => {
                if name.trim().is_empty() {
                    return Err("Category name cannot be empty".into());
                }

                let category = find_record(categories, identifier)
                    .ok_or_else(|| format!("Category not found: {}", identifier))?;
                let updated = app
                    .sync
                    .rename_item::<Category>(owner, &category.id, name.trim())
                    .await?;
                println!("Renamed category:");
                println!("{}", updated);
                Ok(())
            }

            CategorySubcommand::Delete { identifier, force } => {
                let category = find_record(categories, identifier)
                    .ok_or_else(|| format!("Category not found: {}", identifier))?;

                if !force && !confirm(&format!("Delete category '{}'?", category.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                app.sync.delete_item::<Category>(owner, &category.id).await?;
                println!("Deleted category: {}", category.name);
                Ok(())
            }
        }
    }
}
