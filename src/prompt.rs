use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::error::InputError;

/// Print `prompt` on stderr and read one trimmed line from stdin. Stdout is left
/// to tables and JSON.
pub fn ask(prompt: &str) -> Result<String> {
    ask_with(prompt, &mut io::stdin().lock(), &mut io::stderr())
}

fn ask_with(prompt: &str, input: &mut impl BufRead, echo: &mut impl Write) -> Result<String> {
    write!(echo, "{}", prompt)?;
    echo.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Reject blank search terms before anything reaches the portal.
pub fn validate_term(raw: &str) -> Result<String, InputError> {
    let term = raw.trim();
    if term.is_empty() {
        Err(InputError::EmptyTerm)
    } else {
        Ok(term.to_string())
    }
}

/// 1-based choice among `count` results → 0-based index.
pub fn parse_selection(raw: &str, count: usize) -> Result<usize, InputError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(InputError::NotANumber);
    }
    let index: usize = raw.parse().map_err(|_| InputError::OutOfRange {
        index: usize::MAX,
        max: count,
    })?;
    if index < 1 || index > count {
        return Err(InputError::OutOfRange { index, max: count });
    }
    Ok(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_goes_to_the_echo_stream() {
        let mut input = io::Cursor::new(" 2 \n");
        let mut echo = Vec::new();
        let answer = ask_with("Enter the number: ", &mut input, &mut echo).unwrap();
        assert_eq!(answer, "2");
        assert_eq!(String::from_utf8(echo).unwrap(), "Enter the number: ");
    }

    #[test]
    fn blank_terms_rejected() {
        assert_eq!(validate_term(""), Err(InputError::EmptyTerm));
        assert_eq!(validate_term("  \t"), Err(InputError::EmptyTerm));
        assert_eq!(validate_term(" 123.456.789-00 ").unwrap(), "123.456.789-00");
    }

    #[test]
    fn selection_in_range() {
        assert_eq!(parse_selection("1", 3), Ok(0));
        assert_eq!(parse_selection(" 3 ", 3), Ok(2));
    }

    #[test]
    fn selection_not_a_number() {
        assert_eq!(parse_selection("", 3), Err(InputError::NotANumber));
        assert_eq!(parse_selection("two", 3), Err(InputError::NotANumber));
        assert_eq!(parse_selection("-1", 3), Err(InputError::NotANumber));
        assert_eq!(parse_selection("1.5", 3), Err(InputError::NotANumber));
    }

    #[test]
    fn selection_out_of_range() {
        assert_eq!(parse_selection("0", 3), Err(InputError::OutOfRange { index: 0, max: 3 }));
        assert_eq!(parse_selection("4", 3), Err(InputError::OutOfRange { index: 4, max: 3 }));
        assert!(matches!(
            parse_selection("99999999999999999999999", 3),
            Err(InputError::OutOfRange { .. })
        ));
    }
}
