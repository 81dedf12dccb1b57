use crate::catalog::CatalogEntry;

/// A single post-filter condition applied to nearest-neighbour candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    ExcludePosition(usize),
    /// Drops every entry sharing this normalized title.
    ExcludeTitle(String),
    /// Every listed tag must appear in the entry's genre field (case-insensitive substring).
    GenreContains(Vec<String>),
    Category(String),
    MinRating(f64),
}

impl Predicate {
    pub fn matches(&self, position: usize, entry: &CatalogEntry) -> bool {
        match self {
            Predicate::ExcludePosition(excluded) => position != *excluded,
            Predicate::ExcludeTitle(key) => entry.title_key != *key,
            Predicate::GenreContains(tags) => {
                let genre = entry.genre.to_lowercase();
                tags.iter().all(|tag| genre.contains(tag.as_str()))
            }
            Predicate::Category(category) => entry.has_category(category),
            Predicate::MinRating(floor) => entry.rating >= *floor,
        }
    }
}

/// Conjunction of predicates. An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    predicates: Vec<Predicate>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_position(mut self, position: usize) -> Self {
        self.predicates.push(Predicate::ExcludePosition(position));
        self
    }

    pub fn exclude_title(mut self, title_key: &str) -> Self {
        self.predicates.push(Predicate::ExcludeTitle(title_key.to_string()));
        self
    }

    /// Requested text is split on commas; blank text adds no condition.
    pub fn genre_contains(mut self, text: &str) -> Self {
        let tags: Vec<String> = text
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            self.predicates.push(Predicate::GenreContains(tags));
        }
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        let category = category.trim();
        if !category.is_empty() {
            self.predicates.push(Predicate::Category(category.to_string()));
        }
        self
    }

    pub fn min_rating(mut self, floor: f64) -> Self {
        self.predicates.push(Predicate::MinRating(floor));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, position: usize, entry: &CatalogEntry) -> bool {
        self.predicates.iter().all(|p| p.matches(position, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(genre: &str, rating: f64, category: Option<&str>) -> CatalogEntry {
        CatalogEntry::new("X", genre, rating, None, category.map(str::to_string))
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = PostFilter::new().genre_contains("  , ").category(" ");
        assert!(filter.predicates().is_empty());
        assert!(filter.matches(0, &entry("Action", 5.0, None)));
    }

    #[test]
    fn genre_containment_is_case_insensitive_and_conjunctive() {
        let filter = PostFilter::new().genre_contains("romance, SCHOOL");
        assert!(filter.matches(0, &entry("Comedy, Romance, School", 8.0, None)));
        assert!(!filter.matches(0, &entry("Romance", 8.0, None)));
        assert!(PostFilter::new()
            .genre_contains("sci-fi")
            .matches(0, &entry("Action, Sci-Fi", 8.0, None)));
    }

    #[test]
    fn predicates_combine() {
        let filter = PostFilter::new()
            .exclude_position(1)
            .category("movie")
            .min_rating(8.0);
        assert!(filter.matches(0, &entry("Drama", 8.5, Some("Movie"))));
        assert!(!filter.matches(1, &entry("Drama", 8.5, Some("Movie"))));
        assert!(!filter.matches(0, &entry("Drama", 7.9, Some("Movie"))));
        assert!(!filter.matches(0, &entry("Drama", 8.5, Some("TV"))));
        assert!(!filter.matches(0, &entry("Drama", 8.5, None)));
        assert_eq!(filter.predicates().len(), 3);
    }

    #[test]
    fn title_exclusion_matches_normalized_key() {
        let filter = PostFilter::new().exclude_title("naruto");
        let copy = CatalogEntry::new("  NARUTO ", "Action, Drama", 7.0, None, None);
        let other = CatalogEntry::new("Naruto Shippuden", "Action", 7.0, None, None);
        assert!(!filter.matches(3, &copy));
        assert!(filter.matches(3, &other));
    }
}
