//! Text post-processing for message bodies

mod emoji;
mod formatting;

pub use emoji::replace_emojis;
pub use formatting::FormatRemover;
