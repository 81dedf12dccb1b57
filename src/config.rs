use crate::catalog_loader::{DedupPolicy, LoaderConfig};
use crate::similarity_index::ScanMode;
use crate::vectorizer::{TokenMode, TokenizerConfig};
use log::warn;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_CATALOG: &str = "anime.csv";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Candidate pool for genre queries is `count * candidate_multiplier`...
    pub candidate_multiplier: usize,
    /// ...but never smaller than this.
    pub min_candidate_pool: usize,
    pub suggestion_limit: usize,
    /// Fixed seed for category sampling; `None` draws from OS entropy.
    pub sample_seed: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            candidate_multiplier: 10,
            min_candidate_pool: 50,
            suggestion_limit: 3,
            sample_seed: None,
        }
    }
}

impl QueryConfig {
    pub fn candidate_pool(&self, count: usize) -> usize {
        count
            .saturating_mul(self.candidate_multiplier)
            .max(self.min_candidate_pool)
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub catalog_path: PathBuf,
    pub loader: LoaderConfig,
    pub tokenizer: TokenizerConfig,
    pub scan_mode: ScanMode,
    pub query: QueryConfig,
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            loader: LoaderConfig::default(),
            tokenizer: TokenizerConfig::default(),
            scan_mode: ScanMode::Parallel,
            query: QueryConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `ANIME_*` keys.
    /// Unparsable values are logged and ignored.
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(path) = lookup("ANIME_CATALOG").filter(|v| !v.trim().is_empty()) {
            config.catalog_path = PathBuf::from(path);
        }
        if let Some(floor) = env_parsed::<f64, _>(&lookup, "ANIME_RATING_FLOOR") {
            config.loader.rating_floor = floor;
        }
        if let Some(dedup) = env_with(&lookup, "ANIME_DEDUP", DedupPolicy::parse) {
            config.loader.dedup = dedup;
        }
        if let Some(strict) = env_with(&lookup, "ANIME_STRICT", parse_flag) {
            config.loader.require_optional_fields = strict;
        }
        if let Some(mode) = env_with(&lookup, "ANIME_TOKEN_MODE", TokenMode::parse) {
            config.tokenizer.mode = mode;
        }
        if let Some(stop_words) = env_with(&lookup, "ANIME_STOP_WORDS", parse_flag) {
            config.tokenizer.stop_words = stop_words;
        }
        if let Some(mode) = env_with(&lookup, "ANIME_SCAN", ScanMode::parse) {
            config.scan_mode = mode;
        }
        if let Some(value) = env_positive(&lookup, "ANIME_CANDIDATE_MULTIPLIER") {
            config.query.candidate_multiplier = value;
        }
        if let Some(value) = env_positive(&lookup, "ANIME_MIN_CANDIDATE_POOL") {
            config.query.min_candidate_pool = value;
        }
        if let Some(value) = env_positive(&lookup, "ANIME_HISTORY_LIMIT") {
            config.history_limit = value;
        }
        if let Some(seed) = env_parsed::<u64, _>(&lookup, "ANIME_SAMPLE_SEED") {
            config.query.sample_seed = Some(seed);
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_with<T, L, P>(lookup: &L, key: &str, parse: P) -> Option<T>
where
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(key)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!("Ignoring invalid value for {}: '{}'", key, raw);
    }
    parsed
}

fn env_parsed<T: FromStr, L>(lookup: &L, key: &str) -> Option<T>
where
    L: Fn(&str) -> Option<String>,
{
    env_with(lookup, key, |value| value.trim().parse::<T>().ok())
}

fn env_positive<L>(lookup: &L, key: &str) -> Option<usize>
where
    L: Fn(&str) -> Option<String>,
{
    env_parsed::<usize, _>(lookup, key).filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.catalog_path, PathBuf::from("anime.csv"));
        assert_eq!(config.loader.rating_floor, 1.0);
        assert_eq!(config.loader.dedup, DedupPolicy::Title);
        assert_eq!(config.tokenizer, TokenizerConfig::default());
        assert_eq!(config.scan_mode, ScanMode::Parallel);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.query.sample_seed, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("ANIME_CATALOG", "/data/anime.csv"),
            ("ANIME_RATING_FLOOR", "5.5"),
            ("ANIME_DEDUP", "title-genre"),
            ("ANIME_STRICT", "yes"),
            ("ANIME_TOKEN_MODE", "tags"),
            ("ANIME_STOP_WORDS", "off"),
            ("ANIME_SCAN", "sequential"),
            ("ANIME_MIN_CANDIDATE_POOL", "20"),
            ("ANIME_HISTORY_LIMIT", "5"),
            ("ANIME_SAMPLE_SEED", "42"),
        ]);
        assert_eq!(config.catalog_path, PathBuf::from("/data/anime.csv"));
        assert_eq!(config.loader.rating_floor, 5.5);
        assert_eq!(config.loader.dedup, DedupPolicy::TitleAndGenre);
        assert!(config.loader.require_optional_fields);
        assert_eq!(config.tokenizer.mode, TokenMode::Tags);
        assert!(!config.tokenizer.stop_words);
        assert_eq!(config.scan_mode, ScanMode::Sequential);
        assert_eq!(config.query.min_candidate_pool, 20);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.query.sample_seed, Some(42));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("ANIME_RATING_FLOOR", "high"),
            ("ANIME_DEDUP", "everything"),
            ("ANIME_HISTORY_LIMIT", "0"),
            ("ANIME_CANDIDATE_MULTIPLIER", "-3"),
        ]);
        assert_eq!(config.loader.rating_floor, 1.0);
        assert_eq!(config.loader.dedup, DedupPolicy::Title);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.query.candidate_multiplier, 10);
    }

    #[test]
    fn candidate_pool_over_fetches() {
        let query = QueryConfig::default();
        assert_eq!(query.candidate_pool(2), 50);
        assert_eq!(query.candidate_pool(8), 80);
        assert_eq!(query.candidate_pool(usize::MAX), usize::MAX);
    }
}
