pub mod contact;
pub mod loaders;

pub use contact::{ContactRecord, ContactSource, DispatchJob};
pub use loaders::{load_contacts, parse_contacts};
