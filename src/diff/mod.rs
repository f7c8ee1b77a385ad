pub mod merge;

pub use merge::{reconcile, Inventory, UpsertAction};
