mod auth;
mod category;
mod config_cmd;
mod dish;

pub use auth::AuthCommand;
pub use category::CategoryCommand;
pub use config_cmd::ConfigCommand;
pub use dish::DishCommand;

use clap::ValueEnum;
use instaurant_core::{Collection, MenuRecord};
use std::io::{self, Write};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Finds a record by id, falling back to a case-insensitive name match.
fn find_record<'a, R: MenuRecord>(
    collection: Option<&'a Collection<R>>,
    identifier: &str,
) -> Option<&'a R> {
    let collection = collection?;
    collection.get(identifier).or_else(|| {
        collection
            .ordered()
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(identifier.trim()))
    })
}

/// Asks `prompt` on stdout and returns true if the answer is `y`.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
