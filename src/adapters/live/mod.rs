//! Live adapters for real external interactions.

pub mod assets;
pub mod filesystem;
pub mod transform;
pub mod transport;
pub mod view;
