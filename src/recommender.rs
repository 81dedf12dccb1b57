use crate::catalog::{normalize_title, Catalog, CatalogEntry};
use crate::catalog_loader::{CatalogLoader, LoadReport};
use crate::config::{EngineConfig, QueryConfig};
use crate::error::{CatalogError, QueryError};
use crate::filters::PostFilter;
use crate::similarity_index::{Neighbor, SimilarityIndex};
use crate::vectorizer::GenreVectorizer;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

const MIN_SUGGESTION_SIMILARITY: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub title: String,
    pub genre: String,
    pub rating: f64,
    pub members: Option<u64>,
    pub category: Option<String>,
    /// Cosine distance from the query; absent for non-similarity listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl ResultRecord {
    fn from_entry(entry: &CatalogEntry, distance: Option<f64>) -> Self {
        ResultRecord {
            title: entry.title.clone(),
            genre: entry.genre.clone(),
            rating: entry.rating,
            members: entry.members,
            category: entry.category.clone(),
            distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rating,
    Popularity,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rating" => Some(SortKey::Rating),
            "popularity" | "members" => Some(SortKey::Popularity),
            _ => None,
        }
    }

    /// Descending; stable, so equal keys keep distance order.
    fn apply(self, records: &mut [ResultRecord]) {
        match self {
            SortKey::Rating => records.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            SortKey::Popularity => records.sort_by(|a, b| b.members.cmp(&a.members)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreQuery {
    pub text: String,
    pub count: usize,
    pub category: Option<String>,
    /// Keep only entries whose genre field contains every requested tag.
    pub require_genre_match: bool,
    pub min_rating: Option<f64>,
    pub sort: Option<SortKey>,
    /// Overrides the configured over-fetch size.
    pub candidate_pool: Option<usize>,
}

impl GenreQuery {
    pub fn new(text: impl Into<String>, count: usize) -> Self {
        GenreQuery {
            text: text.into(),
            count,
            category: None,
            require_genre_match: true,
            min_rating: None,
            sort: None,
            candidate_pool: None,
        }
    }

    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_string);
        self
    }

    pub fn require_genre_match(mut self, require: bool) -> Self {
        self.require_genre_match = require;
        self
    }

    pub fn min_rating(mut self, floor: Option<f64>) -> Self {
        self.min_rating = floor;
        self
    }

    pub fn sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn candidate_pool(mut self, pool: Option<usize>) -> Self {
        self.candidate_pool = pool;
        self
    }
}

/// Read-only query façade over a fitted catalog. Build once, share behind an `Arc`.
pub struct Recommender {
    catalog: Catalog,
    vectorizer: GenreVectorizer,
    index: SimilarityIndex,
    config: QueryConfig,
    matcher: SkimMatcherV2,
}

impl Recommender {
    /// Fit the genre model over `catalog` and build the similarity index.
    pub fn build(catalog: Catalog, config: &EngineConfig) -> Self {
        let genres: Vec<&str> = catalog.iter().map(|e| e.genre.as_str()).collect();
        let (vectorizer, vectors) = GenreVectorizer::fit(&genres, config.tokenizer);
        let index = SimilarityIndex::new(vectors, config.scan_mode);

        info!(
            "Genre model ready: {} titles, {} vocabulary terms, {:?} scan",
            index.len(),
            vectorizer.vocabulary().len(),
            index.mode()
        );

        Recommender {
            catalog,
            vectorizer,
            index,
            config: config.query.clone(),
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Load the configured catalog and fit the model. Any failure here is fatal.
    pub fn load(config: &EngineConfig) -> Result<(Self, LoadReport), CatalogError> {
        let loader = CatalogLoader::new(config.loader.clone());
        let (catalog, report) = loader.load_from_csv(&config.catalog_path)?;
        Ok((Self::build(catalog, config), report))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vectorizer(&self) -> &GenreVectorizer {
        &self.vectorizer
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Titles most similar in genre to `title`, never including `title` itself.
    pub fn find_by_title(&self, title: &str, count: usize) -> Result<Vec<ResultRecord>, QueryError> {
        let position = self
            .catalog
            .position_of(title)
            .ok_or_else(|| QueryError::TitleNotFound {
                title: title.trim().to_string(),
                suggestions: self.suggest_titles(title),
            })?;

        let (Some(vector), Some(entry)) = (self.index.vector(position), self.catalog.get(position)) else {
            return Ok(Vec::new());
        };

        // Under title+genre de-duplication the same title can occupy several positions.
        let copies = self
            .catalog
            .iter()
            .filter(|e| e.title_key == entry.title_key)
            .count();
        let filter = PostFilter::new()
            .exclude_position(position)
            .exclude_title(&entry.title_key);
        let neighbors = self.index.nearest(vector, count.saturating_add(copies));
        let records = self.collect(&neighbors, &filter, count);

        debug!(
            "Title query '{}' resolved to position {}: {} results",
            title,
            position,
            records.len()
        );

        Ok(records)
    }

    pub fn find_by_genre_text(
        &self,
        genre_text: &str,
        count: usize,
        category_filter: Option<&str>,
    ) -> Vec<ResultRecord> {
        self.search(&GenreQuery::new(genre_text, count).category(category_filter))
    }

    /// Vectorize free genre text, over-fetch candidates, then post-filter and optionally re-sort.
    pub fn search(&self, query: &GenreQuery) -> Vec<ResultRecord> {
        if query.count == 0 || query.text.trim().is_empty() {
            return Vec::new();
        }

        let vector = self.vectorizer.transform(&query.text);
        if vector.is_zero() && !query.require_genre_match {
            debug!("Genre query '{}' shares no terms with the catalog", query.text);
            return Vec::new();
        }

        let mut filter = PostFilter::new();
        if query.require_genre_match {
            filter = filter.genre_contains(&query.text);
        }
        if let Some(category) = query.category.as_deref() {
            filter = filter.category(category);
        }
        if let Some(floor) = query.min_rating {
            filter = filter.min_rating(floor);
        }

        let pool = query
            .candidate_pool
            .unwrap_or_else(|| self.config.candidate_pool(query.count))
            .max(query.count);
        let neighbors = self.index.nearest(&vector, pool);
        let mut records = self.collect(&neighbors, &filter, query.count);

        if let Some(sort) = query.sort {
            sort.apply(&mut records);
        }

        debug!(
            "Genre query '{}': {} candidates, {} predicates, {} results after filtering",
            query.text,
            neighbors.len(),
            filter.predicates().len(),
            records.len()
        );

        records
    }

    /// Random sample of up to `count` entries in `category`, returned in catalog order.
    pub fn find_by_category_sample(&self, category: &str, count: usize) -> Vec<ResultRecord> {
        let members: Vec<&CatalogEntry> = self
            .catalog
            .iter()
            .filter(|entry| entry.has_category(category))
            .collect();

        let amount = count.min(members.len());
        if amount == 0 {
            return Vec::new();
        }

        let mut rng = match self.config.sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut picked = rand::seq::index::sample(&mut rng, members.len(), amount).into_vec();
        picked.sort_unstable();

        picked
            .into_iter()
            .map(|i| ResultRecord::from_entry(members[i], None))
            .collect()
    }

    pub fn top_rated(&self, count: usize, category: Option<&str>) -> Vec<ResultRecord> {
        self.catalog
            .top_rated(count, category)
            .into_iter()
            .filter_map(|position| self.catalog.get(position))
            .map(|entry| ResultRecord::from_entry(entry, None))
            .collect()
    }

    fn collect(&self, neighbors: &[Neighbor], filter: &PostFilter, count: usize) -> Vec<ResultRecord> {
        neighbors
            .iter()
            .filter_map(|n| {
                let entry = self.catalog.get(n.position)?;
                filter
                    .matches(n.position, entry)
                    .then(|| ResultRecord::from_entry(entry, Some(n.distance)))
            })
            .take(count)
            .collect()
    }

    /// Closest catalog titles to a title that failed exact lookup.
    pub fn suggest_titles(&self, title: &str) -> Vec<String> {
        let needle = normalize_title(title);
        if needle.is_empty() || self.config.suggestion_limit == 0 {
            return Vec::new();
        }

        let perfect_score = Self::perfect_score(&self.matcher, &needle);
        let mut scored: Vec<(f64, &str)> = self
            .catalog
            .entries()
            .par_iter()
            .filter_map(|entry| {
                let score = self.matcher.fuzzy_match(&entry.title_key, &needle)?;
                let normalized = Self::normalize_score(score, &entry.title_key, &needle, perfect_score);
                (normalized >= MIN_SUGGESTION_SIMILARITY).then_some((normalized, entry.title.as_str()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(self.config.suggestion_limit)
            .map(|(_, title)| title.to_string())
            .collect()
    }

    fn normalize_score(score: i64, candidate: &str, query: &str, perfect_score: i64) -> f64 {
        if score <= 0 || perfect_score <= 0 {
            return 0.0;
        }

        let base = (score as f64 / perfect_score as f64).min(1.0);
        let candidate_len = candidate.chars().count();
        let query_len = query.chars().count();
        if candidate_len == 0 || query_len == 0 {
            return 0.0;
        }
        let len_ratio =
            (candidate_len.min(query_len) as f64) / (candidate_len.max(query_len) as f64);
        let similarity = (base * len_ratio).min(1.0);

        debug!(
            "Suggestion '{}' for '{}': raw={}, similarity={:.3}",
            candidate, query, score, similarity
        );

        similarity
    }

    fn perfect_score(matcher: &SkimMatcherV2, query: &str) -> i64 {
        matcher
            .fuzzy_match(query, query)
            .unwrap_or((query.len().max(1) as i64) * 10)
            .max(1)
    }
}
