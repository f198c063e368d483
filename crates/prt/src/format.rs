//! Value formatting and parsing
//!
//! Printing writes one value per line; these helpers produce the text
//! without the line terminator.

/// Render an integer (booleans are passed as 0 or 1)
pub fn format_int(value: i32) -> String {
    value.to_string()
}

/// Render a real with the shortest text that reads back as the same value
pub fn format_real(value: f32) -> String {
    value.to_string()
}

/// Parse one integer from a line of input, surrounding blanks ignored
pub fn parse_int(line: &str) -> Option<i32> {
    line.trim().parse().ok()
}

/// Parse one real from a line of input, surrounding blanks ignored
pub fn parse_real(line: &str) -> Option<f32> {
    line.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(7), "7");
        assert_eq!(format_int(-42), "-42");
        assert_eq!(format_int(0), "0");
    }

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(3.5), "3.5");
        assert_eq!(format_real(-0.25), "-0.25");
        assert_eq!(format_real(2.0), "2");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_int(" 12\n"), Some(12));
        assert_eq!(parse_int("x"), None);
        assert_eq!(parse_real("1.5\n"), Some(1.5));
        assert_eq!(parse_real(""), None);
    }
}
