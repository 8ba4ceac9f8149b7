//! Load the Greek and Hebrew Strong's lexicons from JSON files.
//!
//! A lexicon directory holds `greek.json` and `hebrew.json`, each a single
//! object mapping a reference code (`"G26"`, `"H430"`) to a raw entry. Keys
//! are trimmed and uppercased while loading so lookups never depend on how
//! the source files spell them. After loading, a [`LexiconDictionary`] is
//! read-only.
//!
//! Callers choose between memory-mapped files or owned buffers at runtime via
//! [`LoadMode`], and share a dictionary across threads through
//! [`LexiconCache`], which shares one in-flight load among concurrent callers.
//!
//! # Example
//! ```no_run
//! use lexicon_db::{LexiconCache, LoadMode};
//! use scripture_types::LexiconFamily;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cache = LexiconCache::from_dir("/path/to/lexicon", LoadMode::Mmap);
//! let dict = cache.get()?;
//! let agape = dict.entry(LexiconFamily::Greek, "G26").expect("G26 in lexicon");
//! println!("G26: {:?}", agape.strongs_def);
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p lexicon-db --example stats -- <dir>`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use memmap2::Mmap;
use once_cell::sync::OnceCell;
use scripture_types::{LexiconFamily, RawLexiconEntry};
use tracing::{debug, warn};

pub const GREEK_FILE: &str = "greek.json";
pub const HEBREW_FILE: &str = "hebrew.json";

/// Strategy for reading lexicon files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each file while parsing it.
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Both lexicons, keyed by normalized reference code.
#[derive(Clone, Debug, Default)]
pub struct LexiconDictionary {
    greek: HashMap<String, RawLexiconEntry>,
    hebrew: HashMap<String, RawLexiconEntry>,
}

impl LexiconDictionary {
    /// Load both lexicons from `dir`, memory-mapping the files.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(dir, LoadMode::Mmap)
    }

    /// Load both lexicons choosing between mmap and owned buffers at runtime.
    pub fn load_with_mode(dir: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let dir = dir.as_ref();
        for name in [GREEK_FILE, HEBREW_FILE] {
            let path = dir.join(name);
            if !path.exists() {
                anyhow::bail!("missing required lexicon file: {}", path.display());
            }
        }

        let greek = load_lexicon(dir.join(GREEK_FILE), LexiconFamily::Greek, mode)?;
        let hebrew = load_lexicon(dir.join(HEBREW_FILE), LexiconFamily::Hebrew, mode)?;
        Ok(Self { greek, hebrew })
    }

    /// Build a dictionary from in-memory entries, normalizing keys the same
    /// way file loading does.
    pub fn from_entries<G, H, K>(greek: G, hebrew: H) -> Self
    where
        G: IntoIterator<Item = (K, RawLexiconEntry)>,
        H: IntoIterator<Item = (K, RawLexiconEntry)>,
        K: AsRef<str>,
    {
        Self {
            greek: collect_entries(greek, LexiconFamily::Greek, "<memory>"),
            hebrew: collect_entries(hebrew, LexiconFamily::Hebrew, "<memory>"),
        }
    }

    /// Fetch the raw entry for `code` from the given family's lexicon.
    pub fn entry(&self, family: LexiconFamily, code: &str) -> Option<&RawLexiconEntry> {
        let map = self.map(family);
        if let Some(entry) = map.get(code) {
            return Some(entry);
        }
        match normalize_key(code) {
            Cow::Owned(key) => map.get(&key),
            Cow::Borrowed(_) => None,
        }
    }

    pub fn contains(&self, family: LexiconFamily, code: &str) -> bool {
        self.entry(family, code).is_some()
    }

    /// Number of entries in one family's lexicon.
    pub fn len(&self, family: LexiconFamily) -> usize {
        self.map(family).len()
    }

    /// Number of entries across both lexicons.
    pub fn entry_count(&self) -> usize {
        self.greek.len() + self.hebrew.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Iterate over one family's entries in arbitrary order.
    pub fn iter(
        &self,
        family: LexiconFamily,
    ) -> impl Iterator<Item = (&str, &RawLexiconEntry)> + '_ {
        self.map(family).iter().map(|(k, v)| (k.as_str(), v))
    }

    fn map(&self, family: LexiconFamily) -> &HashMap<String, RawLexiconEntry> {
        match family {
            LexiconFamily::Greek => &self.greek,
            LexiconFamily::Hebrew => &self.hebrew,
        }
    }
}

type Loader = Box<dyn Fn() -> Result<LexiconDictionary> + Send + Sync>;
type Outcome = std::result::Result<Arc<LexiconDictionary>, Arc<anyhow::Error>>;

/// One run of the loader. Every caller holding the same attempt observes its
/// outcome, failure included.
#[derive(Default)]
struct Attempt {
    outcome: OnceCell<Outcome>,
}

/// Load-once holder for a shared [`LexiconDictionary`].
///
/// Concurrent first callers block on the single in-flight load and then all
/// observe the same result: the same `Arc` on success, the same error on
/// failure. A failure is not kept once it has been handed out; the next call
/// made after that starts a fresh load.
pub struct LexiconCache {
    loader: Loader,
    cell: OnceCell<Arc<LexiconDictionary>>,
    in_flight: Mutex<Option<Arc<Attempt>>>,
}

impl LexiconCache {
    pub fn new<L>(loader: L) -> Self
    where
        L: Fn() -> Result<LexiconDictionary> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// Cache that loads `greek.json`/`hebrew.json` from `dir` on first use.
    pub fn from_dir(dir: impl Into<PathBuf>, mode: LoadMode) -> Self {
        let dir = dir.into();
        Self::new(move || {
            LexiconDictionary::load_with_mode(&dir, mode)
                .with_context(|| format!("loading lexicons from {}", dir.display()))
        })
    }

    /// Cache that already holds `dict`; the loader is never consulted.
    pub fn preloaded(dict: LexiconDictionary) -> Self {
        Self {
            loader: Box::new(|| Err(anyhow::anyhow!("preloaded lexicon cache has no loader"))),
            cell: OnceCell::with_value(Arc::new(dict)),
            in_flight: Mutex::new(None),
        }
    }

    /// Return the dictionary, joining the in-flight load or starting one if
    /// no load has succeeded yet.
    pub fn get(&self) -> Result<Arc<LexiconDictionary>> {
        if let Some(dict) = self.cell.get() {
            return Ok(Arc::clone(dict));
        }

        let attempt = {
            let mut slot = self.slot();
            // A load may have finished while we waited for the slot.
            if let Some(dict) = self.cell.get() {
                return Ok(Arc::clone(dict));
            }
            Arc::clone(slot.get_or_insert_with(Default::default))
        };
        let outcome = attempt
            .outcome
            .get_or_init(|| (self.loader)().map(Arc::new).map_err(Arc::new));
        if let Ok(dict) = outcome {
            self.cell.get_or_init(|| Arc::clone(dict));
        }

        // Retire the finished attempt so the next caller starts over.
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &attempt)) {
            *slot = None;
        }
        drop(slot);

        match outcome {
            Ok(dict) => Ok(Arc::clone(dict)),
            Err(err) => Err(anyhow::anyhow!("{err:#}")),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<Attempt>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn load_lexicon(
    path: PathBuf,
    family: LexiconFamily,
    mode: LoadMode,
) -> Result<HashMap<String, RawLexiconEntry>> {
    let buffer = load_file(&path, mode)?;
    let raw: HashMap<String, RawLexiconEntry> = serde_json::from_slice(buffer.as_slice())
        .with_context(|| format!("parse {} lexicon {}", family, path.display()))?;
    let source = path.display().to_string();
    let entries = collect_entries(raw, family, &source);
    debug!("loaded {} {} entries from {}", entries.len(), family, source);
    Ok(entries)
}

fn collect_entries<I, K>(
    raw: I,
    family: LexiconFamily,
    source: &str,
) -> HashMap<String, RawLexiconEntry>
where
    I: IntoIterator<Item = (K, RawLexiconEntry)>,
    K: AsRef<str>,
{
    let mut entries = HashMap::new();
    let mut foreign = 0usize;
    for (key, entry) in raw {
        let key = normalize_key(key.as_ref()).into_owned();
        if key.is_empty() {
            warn!("{source}: skipped {family} entry with empty code");
            continue;
        }
        if LexiconFamily::of_code(&key) != Some(family) {
            foreign += 1;
        }
        match entries.entry(key) {
            Entry::Occupied(slot) => {
                warn!("{source}: duplicate {family} code {}, keeping first", slot.key());
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }
    if foreign > 0 {
        warn!("{source}: {foreign} {family} codes do not carry the {family} prefix and are unreachable");
    }
    entries
}

fn normalize_key(code: &str) -> Cow<'_, str> {
    let trimmed = code.trim();
    if trimmed.chars().any(char::is_lowercase) {
        Cow::Owned(trimmed.to_uppercase())
    } else if trimmed.len() != code.len() {
        Cow::Owned(trimmed.to_string())
    } else {
        Cow::Borrowed(code)
    }
}
