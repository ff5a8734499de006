use clap::{Args, Subcommand};
use instaurant_core::{Category, Dish, DishImage, NewDish};
use std::path::PathBuf;

use super::{confirm, find_record, OutputFormat};
use crate::app::App;

#[derive(Args)]
pub struct DishCommand {
    /// Category ID or name the dishes belong to
    #[arg(long, short = 'C', global = true)]
    pub category: Option<String>,

    #[command(subcommand)]
    pub command: DishSubcommand,
}

#[derive(Subcommand)]
pub enum DishSubcommand {
    /// List a category's dishes in display order
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Append a dish to a category
    Add {
        /// Name of the dish
        name: String,

        /// Menu description
        #[arg(long)]
        description: Option<String>,

        /// Price
        #[arg(long)]
        price: Option<f64>,

        /// Image file to upload
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Override the image content type (guessed from the extension)
        #[arg(long, requires = "image")]
        content_type: Option<String>,
    },

    /// Show a dish's details
    Show {
        /// Dish ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a dish
    Rename {
        /// Dish ID or name
        identifier: String,

        /// New name
        name: String,
    },

    /// Delete a dish and close the gap in the ordering
    Delete {
        /// Dish ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl DishCommand {
    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        let owner = app.owner_id()?;
        let identifier = self
            .category
            .as_deref()
            .ok_or("Missing --category. Run 'instaurant category list' to see categories.")?;

        app.sync.fetch_if_needed::<Category>(owner).await?;
        let category_id = app
            .sync
            .store()
            .read(|state| {
                find_record(state.collection::<Category>(owner), identifier).map(|c| c.id.clone())
            })
            .ok_or_else(|| format!("Category not found: {}", identifier))?;

        app.sync.select_category(Some(&category_id));
        app.sync.fetch_if_needed::<Dish>(&category_id).await?;
        let state = app.sync.store().state();
        let dishes = state.collection::<Dish>(&category_id);

        match &self.command {
            DishSubcommand::List { format } => {
                let ordered = dishes.map(|d| d.ordered()).unwrap_or_default();

                if ordered.is_empty() {
                    println!("No dishes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&ordered)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<4}  {:<32}  {:<30}  {:>8}", "POS", "ID", "NAME", "PRICE");
                        println!("{}", "-".repeat(80));
                        for dish in &ordered {
                            let name = if dish.name.chars().count() > 30 {
                                format!("{}...", dish.name.chars().take(27).collect::<String>())
                            } else {
                                dish.name.clone()
                            };
                            println!(
                                "{:<4}  {:<32}  {:<30}  {:>8.2}",
                                dish.order, dish.id, name, dish.price
                            );
                        }
                        println!("\nTotal: {} dish(es)", ordered.len());
                    }
                }
                Ok(())
            }

            DishSubcommand::Add {
                name,
                description,
                price,
                image,
                content_type,
            } => {
                if name.trim().is_empty() {
                    return Err("Dish name cannot be empty".into());
                }
                if price.is_some_and(|p| p < 0.0) {
                    return Err("Price cannot be negative".into());
                }

                let order = dishes.map(|d| d.next_order()).unwrap_or(0);
                let mut fields = NewDish::new(name.trim(), order);
                if let Some(description) = description {
                    fields = fields.with_description(description);
                }
                if let Some(price) = price {
                    fields = fields.with_price(*price);
                }

                let created = match image {
                    Some(path) => {
                        let bytes = std::fs::read(path).map_err(|e| {
                            format!("Failed to read image '{}': {}", path.display(), e)
                        })?;
                        let mut image = DishImage::new(path.to_string_lossy(), bytes);
                        if let Some(content_type) = content_type {
                            image = image.with_content_type(content_type);
                        }
                        tracing::info!(
                            file = %image.file_name,
                            content_type = %image.content_type,
                            "uploading dish image"
                        );
                        app.sync
                            .add_dish_with_image(&category_id, &fields, image)
                            .await?
                    }
                    None => app.sync.add_item::<Dish>(&category_id, &fields).await?,
                };

                println!("Created dish:");
                println!("{}", created);
                Ok(())
            }

            DishSubcommand::Show { identifier, format } => {
                let dish = find_record(dishes, identifier)
                    .ok_or_else(|| format!("Dish not found: {}", identifier))?;
                app.sync.select_dish(Some(&dish.id));

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(dish)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", dish);
                    }
                }
                Ok(())
            }

            DishSubcommand::Rename { identifier, name } => {
                if name.trim().is_empty() {
                    return Err("Dish name cannot be empty".into());
                }

                let dish = find_record(dishes, identifier)
                    .ok_or_else(|| format!("Dish not found: {}", identifier))?;
                let updated = app
                    .sync
                    .rename_item::<Dish>(&category_id, &dish.id, name.trim())
                    .await?;
                println!("Renamed dish:");
                println!("{}", updated);
                Ok(())
            }

            DishSubcommand::Delete { identifier, force } => {
                let dish = find_record(dishes, identifier)
                    .ok_or_else(|| format!("Dish not found: {}", identifier))?;

                if !force && !confirm(&format!("Delete dish '{}'?", dish.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                app.sync.delete_item::<Dish>(&category_id, &dish.id).await?;
                println!("Deleted dish: {}", dish.name);
                Ok(())
            }
        }
    }
}
