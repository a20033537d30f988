//! Environment configuration: named endpoints and their credentials.
mod loader;
pub mod types;


pub use loader::{EnvironmentSet, load_environments};
pub use types::{Environment, EnvironmentEntry};
