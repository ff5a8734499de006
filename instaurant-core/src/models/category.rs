use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::{decode_entry, MenuRecord};
use crate::snapshot::{Snapshot, SnapshotError};

/// A menu category, ranked within its owner's menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub order: i64,
}

/// Fields written when creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

impl MenuRecord for Category {
    type New = NewCategory;

    const COLLECTION: &'static str = "categories";

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
        let (id, fields): (String, NewCategory) = decode_entry(snapshot)?;
        Ok(Self {
            id,
            name: fields.name,
            order: fields.order,
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}. {} ({})", self.order, self.name, self.id)
    }
}
