pub mod item;

pub use item::*;

pub const EMOJI_CHECK: &str = "✅";
pub const EMOJI_CROSS: &str = "❌";
pub const EMOJI_QUESTION: &str = "❓";
