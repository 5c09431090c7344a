//! ANSI/CSI byte-string helpers shared by the line editor, the engine and the
//! colourising command handlers.
//!
//! Output conforms to the xterm-compatible subset named in the external
//! interface contract: CSI cursor moves, clear-screen, and SGR colours.

/// SGR reset.
pub const RESET: &str = "\x1b[0m";
/// Bold green — prompt user@host segment, executables in `ls`.
pub const GREEN: &str = "\x1b[32;1m";
/// Bold blue — prompt cwd segment, directories in `ls`.
pub const BLUE: &str = "\x1b[34;1m";
/// Bold cyan — symlinks in `ls`.
pub const CYAN: &str = "\x1b[36;1m";
/// Magenta — file names in multi-file `grep` output.
pub const MAGENTA: &str = "\x1b[35m";
/// Green (not bold) — line numbers in multi-file `grep` output.
pub const LINE_GREEN: &str = "\x1b[32m";
/// Bold yellow — banners.
pub const YELLOW: &str = "\x1b[33;1m";

/// Clear screen and home the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Move the cursor `n` columns left. Zero moves produce no bytes.
pub fn cursor_left(n: usize) -> String {
    match n {
        0 => String::new(),
        1 => "\x1b[D".to_string(),
        n => format!("\x1b[{}D", n),
    }
}

/// Move the cursor `n` columns right. Zero moves produce no bytes.
pub fn cursor_right(n: usize) -> String {
    match n {
        0 => String::new(),
        1 => "\x1b[C".to_string(),
        n => format!("\x1b[{}C", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves_collapse_zero() {
        assert_eq!(cursor_left(0), "");
        assert_eq!(cursor_right(0), "");
    }

    #[test]
    fn cursor_moves_format() {
        assert_eq!(cursor_left(1), "\x1b[D");
        assert_eq!(cursor_left(4), "\x1b[4D");
        assert_eq!(cursor_right(1), "\x1b[C");
        assert_eq!(cursor_right(12), "\x1b[12C");
    }

    #[test]
    fn clear_screen_homes_the_cursor() {
        assert_eq!(CLEAR_SCREEN, "\x1b[2J\x1b[H");
    }
}
