//! Reference-code resolution against a pair of Strong's lexicons.
//!
//! Codes are trimmed and uppercased, routed to the Greek or Hebrew
//! dictionary by their first letter, and the raw record is mapped onto
//! [`NormalizedDefinition`]. The crate is decoupled from any particular
//! loader: it only needs a lookup callback `(family, code) -> entry`.
//!
//! # How it works
//! 1. Normalize the code (`" g1615 "` becomes `"G1615"`).
//! 2. Pick the dictionary from the prefix; unknown prefixes stop here.
//! 3. Ask the callback for the entry and rename its fields.
//!
//! A miss is not an error. Callers use [`Resolver::resolvable`] to filter
//! candidates and [`Resolver::select`] to fall back to a sibling code.
//!
//! # Example
//! ```no_run
//! use lexicon_db::LexiconDictionary;
//! use lexicon_resolver::{Resolver, Selection};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = LexiconDictionary::load("/path/to/lexicon")?;
//! let resolver = Resolver::new(|family, code| dict.entry(family, code));
//!
//! if let Some(def) = resolver.resolve("g26") {
//!     println!("{}: {:?}", def.number, def.definition);
//! }
//! match resolver.select(&["G9999", "G26"], "G9999") {
//!     Selection::Substituted { shown, .. } => println!("showing {shown} instead"),
//!     other => println!("{other:?}"),
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p lexicon-resolver --example lookup -- <dir> <code>...`.

use scripture_types::{LexiconFamily, NormalizedDefinition, RawLexiconEntry};

/// Outcome of picking one code among the codes attached to a token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    /// The requested code itself resolved.
    Requested(NormalizedDefinition),
    /// The requested code had no entry; the first resolvable sibling is shown.
    Substituted {
        requested: String,
        shown: String,
        definition: NormalizedDefinition,
    },
    /// Neither the requested code nor any sibling resolved.
    Unavailable,
}

impl Selection {
    pub fn definition(&self) -> Option<&NormalizedDefinition> {
        match self {
            Selection::Requested(definition) | Selection::Substituted { definition, .. } => {
                Some(definition)
            }
            Selection::Unavailable => None,
        }
    }

    pub fn is_substitution(&self) -> bool {
        matches!(self, Selection::Substituted { .. })
    }
}

/// Resolver parameterised by a caller-provided dictionary lookup.
pub struct Resolver<F> {
    lookup: F,
}

impl<F> Resolver<F> {
    /// Wrap a lookup callback. It receives the family chosen from the prefix
    /// and the normalized code, and typically delegates to
    /// `LexiconDictionary::entry`.
    pub fn new<'a>(lookup: F) -> Self
    where
        F: Fn(LexiconFamily, &str) -> Option<&'a RawLexiconEntry>,
    {
        Self { lookup }
    }

    /// Resolve one code, or `None` when the prefix is unknown or the
    /// dictionary has no entry for it.
    pub fn resolve<'a>(&self, code: &str) -> Option<NormalizedDefinition>
    where
        F: Fn(LexiconFamily, &str) -> Option<&'a RawLexiconEntry>,
    {
        let number = normalize_code(code);
        let entry = self.entry(&number)?;
        Some(normalize_entry(number, entry))
    }

    /// The candidates that resolve, in input order.
    pub fn resolvable<'a, 'c, S>(&self, codes: &'c [S]) -> Vec<&'c str>
    where
        F: Fn(LexiconFamily, &str) -> Option<&'a RawLexiconEntry>,
        S: AsRef<str>,
    {
        codes
            .iter()
            .map(|code| code.as_ref())
            .filter(|code| self.entry(&normalize_code(code)).is_some())
            .collect()
    }

    /// Pick the definition to show when `requested` is chosen among `codes`.
    pub fn select<'a, S>(&self, codes: &[S], requested: &str) -> Selection
    where
        F: Fn(LexiconFamily, &str) -> Option<&'a RawLexiconEntry>,
        S: AsRef<str>,
    {
        if let Some(definition) = self.resolve(requested) {
            return Selection::Requested(definition);
        }

        let requested = normalize_code(requested);
        let fallback = codes
            .iter()
            .map(|code| normalize_code(code.as_ref()))
            .filter(|code| *code != requested)
            .find_map(|code| {
                let entry = self.entry(&code)?;
                Some(normalize_entry(code, entry))
            });
        match fallback {
            Some(definition) => Selection::Substituted {
                requested,
                shown: definition.number.clone(),
                definition,
            },
            None => Selection::Unavailable,
        }
    }

    fn entry<'a>(&self, normalized: &str) -> Option<&'a RawLexiconEntry>
    where
        F: Fn(LexiconFamily, &str) -> Option<&'a RawLexiconEntry>,
    {
        let family = LexiconFamily::of_code(normalized)?;
        (self.lookup)(family, normalized)
    }
}

/// Trim and uppercase a reference code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Rename raw lexicon fields onto the public definition shape.
pub fn normalize_entry(number: String, entry: &RawLexiconEntry) -> NormalizedDefinition {
    NormalizedDefinition {
        number,
        lemma: entry.lemma.clone(),
        transliteration: entry.translit.clone(),
        pronunciation: entry.pron.clone(),
        part_of_speech: entry.pos.clone(),
        definition: entry.strongs_def.clone(),
        usage: entry.kjv_def.clone(),
        derivation: entry.derivation.clone(),
    }
}
