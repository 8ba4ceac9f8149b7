//! Shared types for annotated scripture text and Strong's-style lexicons.
//!
//! The tokenizer produces [`Token`]s, the loader stores [`RawLexiconEntry`]
//! records per [`LexiconFamily`], and the resolver maps those records onto
//! the stable [`NormalizedDefinition`] shape handed to the display layer.
//! Raw field names follow the lexicon JSON files (`strongs_def`, `kjv_def`,
//! `translit`/`xlit`, ...); normalized names are the public ones.
//!
//! ```rust
//! use scripture_types::{LexiconFamily, Token};
//!
//! assert_eq!(LexiconFamily::of_code("G1615"), Some(LexiconFamily::Greek));
//! assert_eq!(LexiconFamily::of_code("x12"), None);
//!
//! let token = Token::tagged("love", ["G25", "G26"]);
//! assert_eq!(token.reference_codes, vec!["G25", "G26"]);
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Language family of a lexicon, selected by the first character of a code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexiconFamily {
    Greek,
    Hebrew,
}

impl LexiconFamily {
    pub const ALL: [LexiconFamily; 2] = [LexiconFamily::Greek, LexiconFamily::Hebrew];

    /// Parse a code prefix character. Only the uppercase forms are prefixes.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'G' => Some(LexiconFamily::Greek),
            'H' => Some(LexiconFamily::Hebrew),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            LexiconFamily::Greek => 'G',
            LexiconFamily::Hebrew => 'H',
        }
    }

    /// Family of an already-normalized code, judged by its first character.
    pub fn of_code(code: &str) -> Option<Self> {
        code.chars().next().and_then(Self::from_char)
    }
}

impl fmt::Display for LexiconFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LexiconFamily::Greek => "greek",
            LexiconFamily::Hebrew => "hebrew",
        })
    }
}

/// A word or punctuation run with the reference codes attached to it.
///
/// Pre-tokenized verse data may carry the codes under `strongs` as either a
/// single string or a list; both deserialize into `reference_codes`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(
        rename = "referenceCodes",
        alias = "strongs",
        default,
        deserialize_with = "one_or_many"
    )]
    pub reference_codes: Vec<String>,
}

impl Token {
    /// Token without any reference codes.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reference_codes: Vec::new(),
        }
    }

    pub fn tagged<I, S>(text: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into(),
            reference_codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.reference_codes.is_empty()
    }
}

/// A verse as delivered by the data files: plain text plus optional tokens.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<Token>>,
}

/// Lexicon record exactly as stored in the source JSON; every field optional.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawLexiconEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strongs_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<String>,
    #[serde(default, alias = "xlit", skip_serializing_if = "Option::is_none")]
    pub translit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kjv_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pron: Option<String>,
}

/// Definition record with stable public field names.
///
/// `number` is the queried code, trimmed and uppercased.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDefinition {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(code)) => vec![code],
        Some(OneOrMany::Many(codes)) => codes,
    })
}
