//! Database entities.

pub mod client;
pub mod file_metadata;
pub mod product;
pub mod sale;

pub use client::Entity as Client;
pub use file_metadata::Entity as FileMetadata;
pub use product::Entity as Product;
pub use sale::Entity as Sale;
