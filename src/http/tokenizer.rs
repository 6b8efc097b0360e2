//! Bounded string splitting.
//!
//! Inputs and outputs have fixed capacities. Oversized input is refused
//! outright, and a fragment that would not fit a token is truncated instead
//! of growing the token.

use tracing::{debug, error};

use crate::guard::Guard;

/// Capacity of a line buffer. A source must be strictly shorter than this.
pub const BUFFER_SIZE: usize = 1024;

/// Longest text a single token can hold.
pub const TOKEN_CAPACITY: usize = BUFFER_SIZE - 1;

/// Upper bound on the number of tokens one split can produce.
pub const MAX_SPLITS: usize = 100;

/// One piece of split output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    truncated: bool,
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the source fragment was longer than [`TOKEN_CAPACITY`].
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Ordered output of [`split`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResult {
    tokens: Vec<Token>,
}

impl SplitResult {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(Token::as_str)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(Token::as_str)
    }
}

/// Copies at most `capacity` bytes of `src`, cutting on a char boundary.
pub fn bounded_copy(src: &str, capacity: usize, guard: &Guard) -> Token {
    let frame = guard.enter();

    let token = if src.len() <= capacity {
        Token {
            text: src.to_owned(),
            truncated: false,
        }
    } else {
        let mut end = capacity;
        while !src.is_char_boundary(end) {
            end -= 1;
        }
        Token {
            text: src[..end].to_owned(),
            truncated: true,
        }
    };

    guard.leave(frame, token)
}

/// Splits `source` on any character in `delimiters`, producing at most
/// `max_tokens` tokens (never more than [`MAX_SPLITS`]).
///
/// Consecutive delimiters yield empty tokens. Once the token limit is hit the
/// rest of the input is dropped. A source of [`BUFFER_SIZE`] bytes or more
/// yields no tokens at all.
pub fn split(source: &str, delimiters: &str, max_tokens: usize, guard: &Guard) -> SplitResult {
    let frame = guard.enter();
    let max_tokens = max_tokens.min(MAX_SPLITS);
    let mut result = SplitResult::with_capacity(max_tokens);

    debug!("Splitting: [{}]", source);

    if source.len() >= BUFFER_SIZE {
        error!(
            len = source.len(),
            "Refusing to split: source must be shorter than {} bytes", BUFFER_SIZE
        );
        return guard.leave(frame, result);
    }

    let mut rest = source;
    while result.len() < max_tokens {
        match rest.char_indices().find(|(_, c)| delimiters.contains(*c)) {
            Some((at, delim)) => {
                let token = bounded_copy(&rest[..at], TOKEN_CAPACITY, guard);
                debug!("Split: [{}]", token.as_str());
                result.tokens.push(token);
                rest = &rest[at + delim.len_utf8()..];
            }
            None => {
                let token = bounded_copy(rest, TOKEN_CAPACITY, guard);
                debug!("Final split: [{}]", token.as_str());
                result.tokens.push(token);
                break;
            }
        }
    }

    guard.leave(frame, result)
}
