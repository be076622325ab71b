//! Port implementations.

pub mod headless;
pub mod live;
pub mod memory;
pub mod recording;
