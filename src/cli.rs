use crate::config::EngineConfig;
use crate::recommender::SortKey;
use crate::similarity_index::ScanMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "anime-recommender",
    version,
    about = "Recommend anime with similar genres from a CSV catalog"
)]
pub struct CliArgs {
    /// Catalog CSV with name, genre and rating columns (overrides ANIME_CATALOG)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Minimum rating a catalog row needs to be loaded (overrides ANIME_RATING_FLOOR)
    #[arg(long, global = true)]
    pub rating_floor: Option<f64>,

    /// Score candidates on a single thread
    #[arg(long, global = true)]
    pub sequential: bool,

    /// Seed for category sampling (overrides ANIME_SAMPLE_SEED)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Titles with genres similar to the given title
    Title {
        title: String,
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },
    /// Titles matching free genre text, e.g. "Romance, School"
    Genre {
        genres: String,
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Only titles of this format (TV, Movie, OVA, ...)
        #[arg(long)]
        category: Option<String>,
        /// Re-order results by "rating" or "popularity"
        #[arg(long, value_parser = parse_sort_key)]
        sort: Option<SortKey>,
        /// Rank by similarity only, without requiring the genres to appear verbatim
        #[arg(long)]
        no_contains: bool,
        #[arg(long)]
        min_rating: Option<f64>,
        /// Number of nearest candidates fetched before filtering
        #[arg(long)]
        pool: Option<usize>,
    },
    /// Random titles of one format
    Category {
        category: String,
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },
    /// Highest rated titles
    Top {
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        #[arg(long)]
        category: Option<String>,
    },
    /// List the formats present in the catalog
    Categories,
    /// List the fitted genre vocabulary with document frequencies
    Genres,
    /// Interactive session with search history (default)
    Shell {
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Searches remembered this session (overrides ANIME_HISTORY_LIMIT)
        #[arg(long)]
        history_limit: Option<usize>,
    },
}

fn parse_sort_key(value: &str) -> Result<SortKey, String> {
    SortKey::parse(value).ok_or_else(|| format!("expected 'rating' or 'popularity', got '{}'", value))
}

impl CliArgs {
    /// Environment first, then command-line flags on top.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::from_env();
        if let Some(path) = &self.catalog {
            config.catalog_path = path.clone();
        }
        if let Some(floor) = self.rating_floor {
            config.loader.rating_floor = floor;
        }
        if self.sequential {
            config.scan_mode = ScanMode::Sequential;
        }
        if let Some(seed) = self.seed {
            config.query.sample_seed = Some(seed);
        }
        if let Some(Command::Shell {
            history_limit: Some(limit),
            ..
        }) = &self.command
        {
            config.history_limit = (*limit).max(1);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_genre_subcommand() {
        let args = CliArgs::parse_from([
            "anime-recommender",
            "genre",
            "Romance, School",
            "-n",
            "3",
            "--category",
            "TV",
            "--sort",
            "popularity",
            "--json",
        ]);
        assert!(args.json);
        match args.command {
            Some(Command::Genre {
                genres,
                count,
                category,
                sort,
                no_contains,
                ..
            }) => {
                assert_eq!(genres, "Romance, School");
                assert_eq!(count, 3);
                assert_eq!(category.as_deref(), Some("TV"));
                assert_eq!(sort, Some(SortKey::Popularity));
                assert!(!no_contains);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_sort_key() {
        let result = CliArgs::try_parse_from(["anime-recommender", "genre", "Drama", "--sort", "year"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config() {
        let args = CliArgs::parse_from([
            "anime-recommender",
            "--catalog",
            "/tmp/catalog.csv",
            "--sequential",
            "--seed",
            "9",
            "shell",
            "--history-limit",
            "4",
        ]);
        let config = args.engine_config();
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/catalog.csv"));
        assert_eq!(config.scan_mode, ScanMode::Sequential);
        assert_eq!(config.query.sample_seed, Some(9));
        assert_eq!(config.history_limit, 4);
    }
}
