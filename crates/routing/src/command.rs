//! Command token parsing.

/// Split `/token[@bot] args...` into `(token, args)`.
///
/// Returns `None` when the text does not start with a command token.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(i) => (&rest[..i], rest[i..].trim()),
        None => (rest, ""),
    };
    let token = head.split_once('@').map_or(head, |(t, _)| t);
    (!token.is_empty()).then_some((token, args))
}

/// Command tokens as chat platforms accept them: 1-32 chars of `a-z`,
/// `0-9` and `_`.
pub fn is_valid_token(token: &str) -> bool {
    (1..=32).contains(&token.len())
        && token
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
