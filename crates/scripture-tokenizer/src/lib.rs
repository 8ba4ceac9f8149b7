//! Tokenizer for scripture lines carrying inline lexicon tags.
//!
//! Source text looks like `love[G25][G26] one another,`: each tag has the
//! exact form `[<prefix><digits>]` where the prefix is a [`LexiconFamily`]
//! letter. The tokenizer never fails; anything that is not a well-formed tag
//! stays in the text as literal characters.
//!
//! # How it works
//! 1. Split the line on whitespace into parts.
//! 2. Pull every tag out of a part, keeping the codes in order.
//! 3. Classify the cleaned part into leading punctuation, a word core and
//!    trailing punctuation ([`classify`]).
//! 4. Emit the punctuation runs as plain tokens and hang the codes on the
//!    core. Parts that do not split cleanly become one token.
//!
//! # Example
//! ```rust
//! use scripture_tokenizer::tokenize;
//! use scripture_types::Token;
//!
//! let tokens = tokenize("love[G25][G26] one another,");
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::tagged("love", ["G25", "G26"]),
//!         Token::plain("one"),
//!         Token::plain("another"),
//!         Token::plain(","),
//!     ]
//! );
//! ```

use scripture_types::{LexiconFamily, Token, VerseRecord};
use unicode_normalization::char::is_combining_mark;

/// How a cleaned part decomposes around its word core.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Zones<'a> {
    /// Optional punctuation, one contiguous word run, optional punctuation.
    Split {
        leading: &'a str,
        core: &'a str,
        trailing: &'a str,
    },
    /// No word characters at all, or word characters broken up by
    /// punctuation (e.g. `well-being`). Kept as a single token.
    Whole(&'a str),
}

/// Tokenize one line of text into a flat token sequence.
pub fn tokenize(line: &str) -> Vec<Token> {
    tokenize_parts(line).into_iter().flatten().collect()
}

/// Tokenize one line, keeping the tokens of every whitespace-separated part
/// grouped together. Parts that are empty once tags are removed are dropped.
pub fn tokenize_parts(line: &str) -> Vec<Vec<Token>> {
    line.split_whitespace()
        .map(tokenize_part)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Rebuild the tag-free line from grouped tokens: tokens within a part are
/// concatenated, parts are joined by single spaces.
pub fn detokenize(parts: &[Vec<Token>]) -> String {
    parts
        .iter()
        .map(|part| part.iter().map(|t| t.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens for a verse, preferring the pre-tokenized data when it has any.
pub fn verse_tokens(verse: &VerseRecord) -> Vec<Token> {
    match &verse.tokens {
        Some(tokens) if !tokens.is_empty() => tokens.clone(),
        _ => tokenize(&verse.text),
    }
}

/// Remove every reference tag from `part`, returning the cleaned text and
/// the codes in the order they appeared.
///
/// Removing a tag can join brackets into a new tag (`[[G1]G2]`); stripping
/// repeats until the text contains none.
pub fn extract_tags(part: &str) -> (String, Vec<String>) {
    let (mut clean, mut codes) = strip_once(part);
    if codes.is_empty() {
        return (clean, codes);
    }
    loop {
        let (next, found) = strip_once(&clean);
        if found.is_empty() {
            return (clean, codes);
        }
        codes.extend(found);
        clean = next;
    }
}

/// Split a tag-free word into its leading, core and trailing zones.
pub fn classify(word: &str) -> Zones<'_> {
    let Some(core_start) = word.find(is_word_char) else {
        return Zones::Whole(word);
    };
    let core_end = word[core_start..]
        .find(|c: char| !continues_word(c))
        .map_or(word.len(), |n| core_start + n);
    let trailing = &word[core_end..];
    if trailing.contains(is_word_char) {
        return Zones::Whole(word);
    }
    Zones::Split {
        leading: &word[..core_start],
        core: &word[core_start..core_end],
        trailing,
    }
}

/// Letters, digits and apostrophes (straight or typographic) form words.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '\u{2019}'
}

/// Inside a core, combining marks (Hebrew points, decomposed Greek accents)
/// stay attached to the letter they follow.
fn continues_word(c: char) -> bool {
    is_word_char(c) || is_combining_mark(c)
}

fn tokenize_part(part: &str) -> Vec<Token> {
    let (clean, codes) = extract_tags(part);
    if clean.is_empty() {
        return Vec::new();
    }
    match classify(&clean) {
        Zones::Split {
            leading,
            core,
            trailing,
        } => {
            let mut out = Vec::with_capacity(3);
            if !leading.is_empty() {
                out.push(Token::plain(leading));
            }
            out.push(Token {
                text: core.to_string(),
                reference_codes: codes,
            });
            if !trailing.is_empty() {
                out.push(Token::plain(trailing));
            }
            out
        }
        Zones::Whole(text) => vec![Token {
            text: text.to_string(),
            reference_codes: codes,
        }],
    }
}

fn strip_once(text: &str) -> (String, Vec<String>) {
    let mut clean = String::with_capacity(text.len());
    let mut codes = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        clean.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match tag_len(candidate) {
            Some(len) => {
                codes.push(candidate[1..len - 1].to_string());
                rest = &candidate[len..];
            }
            None => {
                clean.push('[');
                rest = &candidate[1..];
            }
        }
    }
    clean.push_str(rest);
    (clean, codes)
}

/// Byte length of the tag starting at `s[0] == '['`, if one starts there.
fn tag_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let prefix = *bytes.get(1)?;
    if !prefix.is_ascii() {
        return None;
    }
    LexiconFamily::from_char(prefix as char)?;
    let digits = bytes[2..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    (bytes.get(2 + digits) == Some(&b']')).then_some(digits + 3)
}
