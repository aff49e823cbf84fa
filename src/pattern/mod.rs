pub mod model;
pub mod persistence;
pub mod store;

pub use model::{Pattern, Step, Track, TrigCondition};
pub use store::PatternStore;
