//! Alphabet validation for the restricted character string types.

/// True when every character belongs to the PrintableString alphabet:
/// letters, digits, and `space ' ( ) + , - . / : = ?`.
pub fn valid_printable_string(text: &str) -> bool {
    text.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                ' ' | '\'' | '(' | ')' | '+' | ',' | '-' | '.' | '/' | ':' | '=' | '?'
            )
    })
}

/// True when every character is in the IA5 range 0..=127.
pub fn valid_ia5_string(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 127)
}
