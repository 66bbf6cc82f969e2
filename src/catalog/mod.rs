pub mod merge;
pub mod store;
pub mod types;

pub use merge::merge_catalogs;
pub use store::{load_catalog, load_catalog_or_empty, save_catalog, save_json};
pub use types::{OilRecord, TagList};
