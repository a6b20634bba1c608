pub mod player;

pub use player::{play, PlaybackOptions, PlaybackSummary};
