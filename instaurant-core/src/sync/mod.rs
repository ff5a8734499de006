//! Synchronization layer between the application store and the remote
//! service.
//!
//! ## Operations
//!
//! - conditional fetch: [`MenuSync::fetch_if_needed`] guarded by
//!   [`should_fetch`]
//! - writes: [`MenuSync::add_item`], [`MenuSync::rename_item`],
//!   [`MenuSync::add_dish_with_image`]
//! - delete with reorder: [`MenuSync::delete_item`] planned by
//!   [`plan_delete`]
//! - session: sign up, sign in/out, password reset

mod client;
mod error;
mod guard;
mod reorder;

pub use client::{normalize_collection, DishImage, MenuSync};
pub use error::{SyncError, SyncResult};
pub use guard::should_fetch;
pub use reorder::{plan_delete, DeletePlan};
