pub mod content;
pub mod store;

pub use content::RestContentAdapter;
pub use store::JsonFileStore;
