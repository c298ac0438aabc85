//! SQLite persistence for the diary: schema plus encrypted entry rows.

pub mod entries;
pub mod schema;

pub use entries::{EntryFields, EntryRecord, SealedFields};
pub use schema::{create_database, open_database, SCHEMA_VERSION};
