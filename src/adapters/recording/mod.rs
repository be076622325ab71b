//! Recording adapters that capture bus traffic to transcripts.

pub mod transport;
