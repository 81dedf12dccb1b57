use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub title_key: String,
    pub genre: String,
    pub rating: f64,
    pub members: Option<u64>,
    pub category: Option<String>,
}

impl CatalogEntry {
    pub fn new(
        title: impl Into<String>,
        genre: impl Into<String>,
        rating: f64,
        members: Option<u64>,
        category: Option<String>,
    ) -> Self {
        let title = title.into();
        CatalogEntry {
            title_key: normalize_title(&title),
            title,
            genre: genre.into(),
            rating,
            members,
            category,
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|own| own.trim().eq_ignore_ascii_case(category.trim()))
    }
}

/// Lookup key for titles: trimmed and lower-cased. The display title is kept as-is.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Immutable, ordered set of catalog entries with case-insensitive title lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from already-filtered entries. When two entries share a
    /// lookup key the first one wins.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut by_title = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            by_title.entry(entry.title_key.clone()).or_insert(position);
        }
        Catalog { entries, by_title }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, position: usize) -> Option<&CatalogEntry> {
        self.entries.get(position)
    }

    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.by_title.get(&normalize_title(title)).copied()
    }

    /// Highest rated entries first; equal ratings keep catalog order.
    pub fn top_rated(&self, count: usize, category: Option<&str>) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| category.map_or(true, |c| entry.has_category(c)))
            .map(|(position, _)| position)
            .collect();

        positions.sort_by(|&a, &b| self.entries[b].rating.total_cmp(&self.entries[a].rating));
        positions.truncate(count);
        positions
    }

    /// Distinct category tags in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for category in self.entries.iter().filter_map(|e| e.category.as_deref()) {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(category)) {
                seen.push(category);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("Cowboy Bebop", "Action, Sci-Fi", 8.8, Some(500), Some("TV".into())),
            CatalogEntry::new("Kimi no Na wa.", "Drama, Romance", 9.4, Some(200), Some("Movie".into())),
            CatalogEntry::new("Trigun", "Action, Comedy", 8.8, None, Some("tv".into())),
            CatalogEntry::new("Haibane Renmei", "Drama, Fantasy", 8.1, None, None),
        ])
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let catalog = sample();
        assert_eq!(catalog.position_of("  COWBOY bebop "), Some(0));
        assert_eq!(catalog.position_of("cowboy"), None);
        assert_eq!(catalog.get(0).map(|e| e.title.as_str()), Some("Cowboy Bebop"));
    }

    #[test]
    fn top_rated_is_stable_on_ties() {
        let catalog = sample();
        assert_eq!(catalog.top_rated(3, None), vec![1, 0, 2]);
        assert_eq!(catalog.top_rated(10, Some("TV")), vec![0, 2]);
        assert!(catalog.top_rated(0, None).is_empty());
    }

    #[test]
    fn categories_are_deduplicated_case_insensitively() {
        assert_eq!(sample().categories(), vec!["TV", "Movie"]);
    }
}
