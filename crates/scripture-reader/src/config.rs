//! Service settings resolved from command-line flags, then environment
//! variables, then built-in defaults.

use std::path::PathBuf;

use lexicon_db::LoadMode;
use tracing::warn;

use crate::DEFAULT_MAX_TEXT_BYTES;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Checked in order; the first existing directory wins.
const LEXICON_DIR_CANDIDATES: [&str; 2] = ["data/lexicon", "/app/lexicon"];

/// Where the lexicon files live and how to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconSource {
    pub dir: PathBuf,
    pub mode: LoadMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub lexicon: LexiconSource,
    pub cache_headers: bool,
    pub max_text_bytes: usize,
}

/// Values given on the command line. `None` defers to the environment.
#[derive(Debug, Default)]
struct Flags {
    lexicon_dir: Option<PathBuf>,
    lexicon_mode: Option<LoadMode>,
    no_cache: bool,
}

impl Flags {
    fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Flags::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(value.to_string())),
                None => (arg, None),
            };
            match name.as_str() {
                "--no-cache" => flags.no_cache = true,
                "--lexicon-dir" => {
                    flags.lexicon_dir = inline.or_else(|| args.next()).map(PathBuf::from);
                }
                "--lexicon-mode" => {
                    let value = inline.or_else(|| args.next()).unwrap_or_default();
                    flags.lexicon_mode = parse_mode(&value, "--lexicon-mode");
                }
                other => warn!("ignoring unknown argument {other}"),
            }
        }
        flags
    }
}

impl ServiceConfig {
    /// Settings for the running process.
    pub fn from_process() -> Self {
        Self::resolve(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Layer `args` over the variables `var` returns, over the defaults.
    pub fn resolve<I, V>(args: I, var: V) -> Self
    where
        I: IntoIterator<Item = String>,
        V: Fn(&str) -> Option<String>,
    {
        let flags = Flags::parse(args);
        let dir = flags
            .lexicon_dir
            .or_else(|| var("LEXICON_DIR").map(PathBuf::from))
            .unwrap_or_else(default_lexicon_dir);
        let mode = flags
            .lexicon_mode
            .or_else(|| {
                var("LEXICON_LOAD_MODE").and_then(|raw| parse_mode(&raw, "LEXICON_LOAD_MODE"))
            })
            .unwrap_or(LoadMode::Mmap);

        ServiceConfig {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(&var, "PORT").unwrap_or(DEFAULT_PORT),
            lexicon: LexiconSource { dir, mode },
            cache_headers: !flags.no_cache,
            max_text_bytes: parse_var::<usize, _>(&var, "MAX_TOKENIZE_BYTES")
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_MAX_TEXT_BYTES),
        }
    }
}

fn parse_var<T, V>(var: &V, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    let raw = var(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!("ignoring {key}={raw:?}: not a valid value");
    }
    parsed
}

fn parse_mode(raw: &str, origin: &str) -> Option<LoadMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => {
            warn!("ignoring {origin}={raw:?}: expected mmap or owned");
            None
        }
    }
}

fn default_lexicon_dir() -> PathBuf {
    LEXICON_DIR_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(LEXICON_DIR_CANDIDATES[0]))
}
