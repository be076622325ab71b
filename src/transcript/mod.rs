//! Bus transcripts: recording both directions of a panel's traffic and
//! replaying the host side into a fresh renderer.

pub mod format;
pub mod recorder;
pub mod replayer;

pub use format::{Frame, Transcript};
pub use recorder::TranscriptRecorder;
pub use replayer::{Replay, TranscriptReplayer};
