//! # Input Sanitizer
//!
//! Every free-text entity passes through here before it is stored or turned
//! into a search pattern.
//!
//! ```text
//! raw ──► control chars dropped (tab/newline → space) ──► trimmed ──► ≤ max chars
//!                                                                       │
//!                               search patterns only ──► escape_like ◄──┘
//! ```

/// Max length of a product search query.
pub const MAX_QUERY_LEN: usize = 100;

/// Max length of names, titles and other stored text.
pub const MAX_TEXT_LEN: usize = 200;

/// Escape character used in every `LIKE` pattern the bridge builds.
pub const LIKE_ESCAPE: char = '\\';

/// Strips control characters, trims, and truncates to `max_len` characters.
///
/// Whitespace controls (tab, newline, carriage return) become spaces so
/// words on separate lines stay separate.
pub fn sanitize_input(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '\t' | '\n' | '\r' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    cleaned.trim().chars().take(max_len).collect::<String>().trim_end().to_string()
}

/// Escapes `LIKE` metacharacters (`\`, `%`, `_`) so they match literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive `LIKE` match with `\` as escape character.
///
/// Mirrors `ILIKE pattern ESCAPE '\'` for stores that evaluate patterns
/// in process.
pub fn like_matches(pattern: &str, candidate: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Any,
        One,
        Lit(char),
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars().flat_map(char::to_lowercase);
    while let Some(c) = chars.next() {
        match c {
            '%' => tokens.push(Token::Any),
            '_' => tokens.push(Token::One),
            LIKE_ESCAPE => tokens.push(Token::Lit(chars.next().unwrap_or(LIKE_ESCAPE))),
            c => tokens.push(Token::Lit(c)),
        }
    }
    let text: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();

    // dp[j]: tokens[..i] match text[..j]
    let mut dp = vec![false; text.len() + 1];
    dp[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::Any => {
                let mut reachable = false;
                for j in 0..=text.len() {
                    reachable |= dp[j];
                    next[j] = reachable;
                }
            }
            Token::One => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1];
                }
            }
            Token::Lit(c) => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1] && text[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[text.len()]
}
