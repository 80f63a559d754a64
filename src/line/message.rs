use crate::models::{ItemSnapshot, MonitoredItem, EMOJI_CHECK, EMOJI_CROSS};

/// Direction of an availability flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Restocked,
    SoldOut,
}

impl Transition {
    pub fn symbol(&self) -> &'static str {
        match self {
            Transition::Restocked => EMOJI_CHECK,
            Transition::SoldOut => EMOJI_CROSS,
        }
    }
}

/// LINE Notify prefixes the sender name, so the text starts on a new line.
pub fn format_stock_message(item: &MonitoredItem, snapshot: &ItemSnapshot, transition: Transition) -> String {
    format!(
        "\n{}\n{}{}\n{}",
        snapshot.display_name(),
        transition.symbol(),
        snapshot.stock,
        item.url
    )
}
