use crate::vectorizer::GenreVector;
use log::debug;
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Sequential,
    Parallel,
}

impl ScanMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" | "single" => Some(ScanMode::Sequential),
            "parallel" | "rayon" => Some(ScanMode::Parallel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Catalog position of the matched entry.
    pub position: usize,
    pub distance: f64,
}

fn by_distance_then_position(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}

/// Exhaustive cosine-distance index over every catalog vector.
pub struct SimilarityIndex {
    vectors: Vec<GenreVector>,
    mode: ScanMode,
}

impl SimilarityIndex {
    pub fn new(vectors: Vec<GenreVector>, mode: ScanMode) -> Self {
        SimilarityIndex { vectors, mode }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn vector(&self, position: usize) -> Option<&GenreVector> {
        self.vectors.get(position)
    }

    /// The `min(k, len)` closest entries, nearest first. Equal distances keep catalog order.
    pub fn nearest(&self, query: &GenreVector, k: usize) -> Vec<Neighbor> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        let score = |(position, vector): (usize, &GenreVector)| Neighbor {
            position,
            distance: query.cosine_distance(vector),
        };

        let mut neighbors: Vec<Neighbor> = match self.mode {
            ScanMode::Sequential => self.vectors.iter().enumerate().map(score).collect(),
            ScanMode::Parallel => self.vectors.par_iter().enumerate().map(score).collect(),
        };

        let k = k.min(neighbors.len());
        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_distance_then_position);
            neighbors.truncate(k);
        }
        neighbors.sort_by(by_distance_then_position);

        debug!(
            "Nearest-neighbour scan over {} vectors returned {} (closest distance {:.4})",
            self.vectors.len(),
            neighbors.len(),
            neighbors.first().map_or(f64::NAN, |n| n.distance)
        );

        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{GenreVectorizer, TokenizerConfig};

    fn index_for(genres: &[&str], mode: ScanMode) -> (GenreVectorizer, SimilarityIndex) {
        let (vectorizer, vectors) = GenreVectorizer::fit(genres, TokenizerConfig::default());
        (vectorizer, SimilarityIndex::new(vectors, mode))
    }

    const GENRES: [&str; 5] = [
        "Action, Comedy",
        "Action, Drama",
        "Romance",
        "Action, Comedy",
        "Comedy, Romance, School",
    ];

    #[test]
    fn nearest_orders_by_distance_with_stable_ties() {
        let (_, index) = index_for(&GENRES, ScanMode::Sequential);
        let query = index.vector(0).unwrap().clone();
        let neighbors = index.nearest(&query, 5);

        let positions: Vec<usize> = neighbors.iter().map(|n| n.position).collect();
        assert_eq!(positions[..2], [0, 3]);
        assert!(neighbors[0].distance < 1e-9);
        assert_eq!(neighbors[0].distance, neighbors[1].distance);
        assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(positions.last(), Some(&2));
    }

    #[test]
    fn result_length_is_min_of_k_and_size() {
        let (vectorizer, index) = index_for(&GENRES, ScanMode::Sequential);
        let query = vectorizer.transform("Drama");
        assert_eq!(index.nearest(&query, 2).len(), 2);
        assert_eq!(index.nearest(&query, 50).len(), GENRES.len());
        assert!(index.nearest(&query, 0).is_empty());
    }

    #[test]
    fn parallel_and_sequential_scans_agree() {
        let (vectorizer, sequential) = index_for(&GENRES, ScanMode::Sequential);
        let (_, parallel) = index_for(&GENRES, ScanMode::Parallel);
        for text in ["Action", "Romance, School", "Comedy", "Mecha"] {
            let query = vectorizer.transform(text);
            for k in [1, 3, 5] {
                assert_eq!(sequential.nearest(&query, k), parallel.nearest(&query, k));
            }
        }
    }

    #[test]
    fn truncated_result_is_prefix_of_full_ranking() {
        let (vectorizer, index) = index_for(&GENRES, ScanMode::Parallel);
        let query = vectorizer.transform("Comedy");
        let full = index.nearest(&query, GENRES.len());
        for k in 1..=GENRES.len() {
            assert_eq!(index.nearest(&query, k), full[..k].to_vec());
        }
    }

    #[test]
    fn own_genre_string_is_closest_match() {
        let (vectorizer, index) = index_for(&GENRES, ScanMode::Sequential);
        for (position, genre) in GENRES.iter().enumerate() {
            let top = index.nearest(&vectorizer.transform(genre), 1)[0];
            let own = index
                .vector(position)
                .map(|v| v.cosine_distance(&vectorizer.transform(genre)))
                .unwrap();
            assert!((top.distance - own).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_query_vector_keeps_catalog_order() {
        let (vectorizer, index) = index_for(&GENRES, ScanMode::Sequential);
        let neighbors = index.nearest(&vectorizer.transform("Mecha"), 3);
        let positions: Vec<usize> = neighbors.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(neighbors.iter().all(|n| n.distance == 1.0));
    }
}
