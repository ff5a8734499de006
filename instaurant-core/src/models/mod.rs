mod category;
mod dish;
mod record;

pub use category::{Category, NewCategory};
pub use dish::{Dish, NewDish};
pub use record::MenuRecord;
