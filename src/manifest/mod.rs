pub mod loader;

pub use loader::{Manifest, ManifestRecord};
