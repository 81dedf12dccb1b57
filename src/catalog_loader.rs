use crate::catalog::{normalize_title, Catalog, CatalogEntry};
use crate::error::CatalogError;
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::path::Path;

const TITLE_COLUMNS: &[&str] = &["name", "title"];
const GENRE_COLUMNS: &[&str] = &["genre", "genres"];
const RATING_COLUMNS: &[&str] = &["rating", "score"];
const MEMBERS_COLUMNS: &[&str] = &["members", "popularity"];
const CATEGORY_COLUMNS: &[&str] = &["type", "category", "format"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// One entry per normalized title.
    Title,
    /// One entry per (normalized title, genre) pair.
    TitleAndGenre,
}

impl DedupPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(DedupPolicy::Title),
            "title-genre" | "title_genre" | "title+genre" => Some(DedupPolicy::TitleAndGenre),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub rating_floor: f64,
    pub dedup: DedupPolicy,
    /// Also drop rows without a popularity count or a category.
    pub require_optional_fields: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            rating_floor: 1.0,
            dedup: DedupPolicy::Title,
            require_optional_fields: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub processed: usize,
    pub kept: usize,
    pub dropped_incomplete: usize,
    pub dropped_low_rating: usize,
    pub dropped_duplicate: usize,
    pub errors: Vec<String>,
}

struct Columns {
    title: usize,
    genre: usize,
    rating: usize,
    members: Option<usize>,
    category: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, CatalogError> {
        let required = |names: &[&'static str]| {
            find_column(headers, names).ok_or_else(|| CatalogError::MissingColumn {
                path: path.to_path_buf(),
                column: names[0],
            })
        };

        Ok(Columns {
            title: required(TITLE_COLUMNS)?,
            genre: required(GENRE_COLUMNS)?,
            rating: required(RATING_COLUMNS)?,
            members: find_column(headers, MEMBERS_COLUMNS),
            category: find_column(headers, CATEGORY_COLUMNS),
        })
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let header = h.trim();
        names.iter().any(|name| header.eq_ignore_ascii_case(name))
    })
}

fn non_empty<'r>(record: &'r StringRecord, index: usize) -> Option<&'r str> {
    record.get(index).map(str::trim).filter(|v| !v.is_empty())
}

enum RowOutcome {
    Keep(CatalogEntry),
    Incomplete,
    LowRating,
}

pub struct CatalogLoader {
    config: LoaderConfig,
}

impl CatalogLoader {
    pub fn new(config: LoaderConfig) -> Self {
        CatalogLoader { config }
    }

    /// Load the catalog from a CSV file with a header row.
    /// Requires title, genre and rating columns; popularity and category are optional.
    pub fn load_from_csv_with_progress<P, F>(
        &self,
        csv_path: P,
        mut progress_callback: Option<F>,
    ) -> Result<(Catalog, LoadReport), CatalogError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, u64, u64),
    {
        let path = csv_path.as_ref();
        let io_error = |source: std::io::Error| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        let total_bytes = fs::metadata(path).map_err(io_error)?.len().max(1);
        let file = File::open(path).map_err(io_error)?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers().map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let columns = Columns::resolve(headers, path)?;

        let mut report = LoadReport::default();
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        let mut record = StringRecord::new();

        loop {
            match reader.read_record(&mut record) {
                Ok(true) => {
                    report.processed += 1;

                    match self.parse_row(&record, &columns) {
                        RowOutcome::Keep(entry) => {
                            if seen.insert(self.dedup_key(&entry)) {
                                entries.push(entry);
                            } else {
                                report.dropped_duplicate += 1;
                            }
                        }
                        RowOutcome::Incomplete => report.dropped_incomplete += 1,
                        RowOutcome::LowRating => report.dropped_low_rating += 1,
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    report.processed += 1;
                    // Quoted fields may span lines, so take the line from the reader.
                    let line = e
                        .position()
                        .map(|pos| pos.line())
                        .unwrap_or_else(|| reader.position().line());
                    warn!("Skipping malformed catalog row at line {}: {}", line, e);
                    report.errors.push(format!("Line {}: {}", line, e));
                }
            }

            if let Some(cb) = progress_callback.as_mut() {
                let bytes_read = reader.position().byte();
                cb(report.processed, bytes_read, total_bytes);
            }
        }

        report.kept = entries.len();

        if entries.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }

        info!(
            "Loaded catalog {}: {} rows read, {} kept ({} incomplete, {} below rating {}, {} duplicate, {} malformed)",
            path.display(),
            report.processed,
            report.kept,
            report.dropped_incomplete,
            report.dropped_low_rating,
            self.config.rating_floor,
            report.dropped_duplicate,
            report.errors.len()
        );

        Ok((Catalog::from_entries(entries), report))
    }

    pub fn load_from_csv<P: AsRef<Path>>(
        &self,
        csv_path: P,
    ) -> Result<(Catalog, LoadReport), CatalogError> {
        self.load_from_csv_with_progress(csv_path, Option::<fn(usize, u64, u64)>::None)
    }

    fn parse_row(&self, record: &StringRecord, columns: &Columns) -> RowOutcome {
        let (Some(title), Some(genre), Some(raw_rating)) = (
            non_empty(record, columns.title),
            non_empty(record, columns.genre),
            non_empty(record, columns.rating),
        ) else {
            return RowOutcome::Incomplete;
        };

        let rating = match raw_rating.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => return RowOutcome::Incomplete,
        };

        let members = columns
            .members
            .and_then(|i| non_empty(record, i))
            .and_then(|v| v.parse::<u64>().ok());
        let category = columns
            .category
            .and_then(|i| non_empty(record, i))
            .map(str::to_string);

        if self.config.require_optional_fields && (members.is_none() || category.is_none()) {
            return RowOutcome::Incomplete;
        }

        if rating < self.config.rating_floor {
            return RowOutcome::LowRating;
        }

        RowOutcome::Keep(CatalogEntry::new(title, genre, rating, members, category))
    }

    fn dedup_key(&self, entry: &CatalogEntry) -> (String, Option<String>) {
        match self.config.dedup {
            DedupPolicy::Title => (entry.title_key.clone(), None),
            DedupPolicy::TitleAndGenre => (
                entry.title_key.clone(),
                Some(normalize_title(&entry.genre)),
            ),
        }
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}
