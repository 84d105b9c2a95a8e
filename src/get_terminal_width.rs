use terminal_size::{terminal_size, Width};

/// The width of the terminal attached to stdout, minus `margin`, or
/// 120 if there is no terminal (e.g. output is piped).
pub fn get_terminal_width(margin: u16) -> usize {
    if let Some((Width(width), _)) = terminal_size() {
        width.saturating_sub(margin).into()
    } else {
        120
    }
}
