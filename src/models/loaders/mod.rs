pub mod contact_loader;

pub use contact_loader::{load_contacts, parse_contacts};
