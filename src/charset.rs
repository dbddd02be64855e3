//! Alphabet assembly
//!
//! A [`Charset`] is the pool of characters random fragments are drawn from.
//! It is built once per run from class toggles (or a custom override) and is
//! read-only afterwards. An empty charset is a configuration error, not a
//! degenerate run.

use thiserror::Error;

/// Lowercase ASCII letters.
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
/// Uppercase ASCII letters.
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// ASCII digits.
pub const DIGITS: &str = "0123456789";
/// Punctuation that plausibly appears in C source.
pub const SYMBOLS: &str = "+-*/=<>!&|^%~?:;,.(){}[]'\"\\";
/// Space, tab, newline.
pub const WHITESPACE: &str = " \t\n";

/// Errors from charset construction.
#[derive(Debug, Error)]
pub enum CharsetError {
    /// Every character class was excluded and no custom set was given.
    #[error("charset is empty: at least one character class must be included")]
    Empty,
}

/// Which character classes to include when building a [`Charset`].
#[derive(Debug, Clone)]
pub struct CharsetOptions {
    /// Include lowercase letters.
    pub lowercase: bool,
    /// Include uppercase letters.
    pub uppercase: bool,
    /// Include digits.
    pub digits: bool,
    /// Include C-flavored punctuation.
    pub symbols: bool,
    /// Include space, tab, and newline.
    pub whitespace: bool,
    /// Explicit character set; overrides all class toggles when set.
    pub custom: Option<String>,
}

impl Default for CharsetOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            uppercase: true,
            digits: true,
            symbols: true,
            whitespace: false,
            custom: None,
        }
    }
}

/// The set of characters eligible for random content generation.
#[derive(Debug, Clone)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Assemble a charset from the given options.
    pub fn build(opts: &CharsetOptions) -> Result<Self, CharsetError> {
        let mut pool = String::new();

        if let Some(custom) = &opts.custom {
            pool.push_str(custom);
        } else {
            if opts.lowercase {
                pool.push_str(LOWERCASE);
            }
            if opts.uppercase {
                pool.push_str(UPPERCASE);
            }
            if opts.digits {
                pool.push_str(DIGITS);
            }
            if opts.symbols {
                pool.push_str(SYMBOLS);
            }
            if opts.whitespace {
                pool.push_str(WHITESPACE);
            }
        }

        let chars: Vec<char> = pool.chars().collect();
        if chars.is_empty() {
            return Err(CharsetError::Empty);
        }
        Ok(Self { chars })
    }

    /// Number of characters in the set.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the set holds no characters. Construction rejects this, so
    /// a built charset always returns false.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The characters themselves, for uniform indexing.
    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    /// K^N: the number of distinct fragments of `len` characters over this
    /// set. Returned as `f64` because the value overflows `u64` at trivial
    /// alphabet/length combinations.
    pub fn combination_space(&self, len: u32) -> f64 {
        (self.chars.len() as f64).powi(len as i32)
    }

    /// Short preview for the startup banner: first 50 characters, with an
    /// ellipsis when truncated.
    pub fn preview(&self) -> String {
        if self.chars.len() <= 50 {
            self.chars.iter().collect()
        } else {
            let head: String = self.chars.iter().take(50).collect();
            format!("{head}...")
        }
    }
}
