use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::{decode_entry, MenuRecord};
use crate::snapshot::{Snapshot, SnapshotError};

/// A dish on the menu, ranked within its category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub order: i64,
}

/// Fields written when creating a dish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDish {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i64,
}

impl NewDish {
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: 0.0,
            image_url: None,
            order,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }
}

impl MenuRecord for Dish {
    type New = NewDish;

    const COLLECTION: &'static str = "dishes";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }

    fn from_snapshot(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        let (id, fields): (String, NewDish) = decode_entry(snapshot)?;
        Ok(Self {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            image_url: fields.image_url.filter(|url| !url.is_empty()),
            order: fields.order,
        })
    }
}

impl fmt::Display for Dish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Position: {}", self.order)?;
        writeln!(f, "Price: {:.2}", self.price)?;

        if let Some(url) = &self.image_url {
            writeln!(f, "Image: {}", url)?;
        }

        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        Ok(())
    }
}
