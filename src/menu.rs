//! Interactive menu: option table and keypress-to-command mapping.
//!
//! The command set is a convention between this caller and the firmware: one
//! ASCII digit per action, sent verbatim as a single byte.

/// Options shown to the user, in menu order.
pub const MENU_OPTIONS: [&str; 5] = [
    "1 - Turn on the red LED",
    "2 - Turn on the yellow LED",
    "3 - Turn on the blue LED",
    "4 - Turn off all LEDs",
    "5 - Quit",
];

/// Result of interpreting one line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// A device command: the byte to send verbatim.
    Command(u8),
    /// The user asked to end the session.
    Quit,
    /// Input that maps to nothing; reprint the menu.
    Invalid,
}

/// Render the menu as a single printable block.
pub fn render_menu() -> String {
    let mut out = String::from("\nSelect an option:\n");
    for option in MENU_OPTIONS {
        out.push_str(option);
        out.push('\n');
    }
    out.push_str("> ");
    out
}

/// Map one line of user input to a menu choice.
///
/// Only the first non-whitespace character counts; digits '1'..='4' become
/// command bytes, '5' quits.
pub fn parse_choice(input: &str) -> MenuChoice {
    match input.trim().as_bytes() {
        [byte @ b'1'..=b'4'] => MenuChoice::Command(*byte),
        [b'5'] => MenuChoice::Quit,
        _ => MenuChoice::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_map_to_command_bytes() {
        assert_eq!(parse_choice("1"), MenuChoice::Command(b'1'));
        assert_eq!(parse_choice("4"), MenuChoice::Command(b'4'));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_choice("  2\n"), MenuChoice::Command(b'2'));
    }

    #[test]
    fn test_quit() {
        assert_eq!(parse_choice("5"), MenuChoice::Quit);
    }

    #[test]
    fn test_everything_else_is_invalid() {
        assert_eq!(parse_choice(""), MenuChoice::Invalid);
        assert_eq!(parse_choice("0"), MenuChoice::Invalid);
        assert_eq!(parse_choice("6"), MenuChoice::Invalid);
        assert_eq!(parse_choice("12"), MenuChoice::Invalid);
        assert_eq!(parse_choice("quit"), MenuChoice::Invalid);
    }

    #[test]
    fn test_menu_lists_every_option() {
        let menu = render_menu();
        for option in MENU_OPTIONS {
            assert!(menu.contains(option));
        }
    }
}
