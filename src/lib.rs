// Library surface for the decoder and the speed engine.
// The binary in main.rs is a thin JSON front end over these modules.
pub mod curve;
pub mod decoder;
pub mod error;
pub mod mistakes;
pub mod segments;
pub mod speed;
pub mod universe;
pub mod util;

pub use curve::{CurvePoint, WpmCurve};
pub use decoder::{decode, Action, ActionGroup, DecodedLog, Keystroke, TypingLogEvent};
pub use error::LogError;
pub use mistakes::Typo;
pub use segments::{segment_speeds, segment_texts, word_speeds, SegmentSpeed};
pub use speed::{compute_speeds, RawSpeeds, SpeedPolicy, SpeedRecord};
pub use universe::{universe_multiplier, DEFAULT_MULTIPLIER};
