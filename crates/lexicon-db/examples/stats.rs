use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lexicon_db::{LexiconDictionary, LoadMode};
use scripture_types::LexiconFamily;

fn main() -> Result<()> {
    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lexicon-db --example stats -- <path-to-lexicon-dir>")?;

    let dict = LexiconDictionary::load_with_mode(&dir, LoadMode::Mmap)
        .with_context(|| format!("loading lexicons from {}", dir.display()))?;

    println!("Lexicon dir: {}", dir.display());
    for family in LexiconFamily::ALL {
        let mut with_lemma = 0usize;
        let mut with_pos = 0usize;
        let mut with_derivation = 0usize;
        for (_, entry) in dict.iter(family) {
            with_lemma += usize::from(entry.lemma.is_some());
            with_pos += usize::from(entry.pos.is_some());
            with_derivation += usize::from(entry.derivation.is_some());
        }
        println!("{family}:");
        println!("  entries        : {}", dict.len(family));
        println!("  with lemma     : {with_lemma}");
        println!("  with pos       : {with_pos}");
        println!("  with derivation: {with_derivation}");
    }

    // Spot-check a couple of codes to confirm lookup.
    for (family, code) in [(LexiconFamily::Greek, "G26"), (LexiconFamily::Hebrew, "H430")] {
        println!("Code '{}' ({}) present? {}", code, family, dict.contains(family, code));
    }

    Ok(())
}
