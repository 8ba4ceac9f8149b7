use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lexicon_db::{LexiconDictionary, LoadMode};
use lexicon_resolver::{Resolver, Selection};

const USAGE: &str =
    "usage: cargo run -p lexicon-resolver --example lookup -- <lexicon-dir> [--demo | <code>...]";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let dir = args.next().map(PathBuf::from).context(USAGE)?;
    let rest: Vec<String> = args.collect();

    let codes: Vec<String> = match rest.first().map(String::as_str) {
        None => bail!(USAGE),
        Some("--demo") => ["G9999", "g26", " G25 ", "H430", "X1"]
            .into_iter()
            .map(String::from)
            .collect(),
        Some(_) => rest,
    };

    let dict = LexiconDictionary::load_with_mode(&dir, LoadMode::Mmap)
        .with_context(|| format!("loading lexicons from {}", dir.display()))?;
    let resolver = Resolver::new(|family, code| dict.entry(family, code));

    println!("Lexicon dir: {}", dir.display());

    for code in &codes {
        match resolver.resolve(code) {
            Some(def) => println!(
                "{:<8} {} | {}",
                def.number,
                def.lemma.as_deref().unwrap_or("-"),
                def.definition.as_deref().unwrap_or("-")
            ),
            None => println!("{:<8} not found", code.trim()),
        }
    }

    println!("\nResolvable: {:?}", resolver.resolvable(codes.as_slice()));
    if let Some(first) = codes.first() {
        match resolver.select(codes.as_slice(), first) {
            Selection::Requested(def) => println!("Selecting {}: shown as requested", def.number),
            Selection::Substituted {
                requested, shown, ..
            } => println!("Selecting {requested}: substituted by {shown}"),
            Selection::Unavailable => println!("Selecting {}: no definition available", first),
        }
    }

    Ok(())
}
