use crate::recommender::ResultRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryKind {
    Title(String),
    Genre(String),
    Category(String),
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Title(title) => write!(f, "{}", title),
            QueryKind::Genre(genre) => write!(f, "genre: {}", genre),
            QueryKind::Category(category) => write!(f, "category: {}", category),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHistoryEntry {
    pub query: QueryKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRecord {
    pub query: QueryKind,
    pub results: Vec<ResultRecord>,
    pub at: DateTime<Utc>,
}

/// Per-session log of queries and their results. Keeps only the most recent
/// `retention` of each; never shared between sessions.
#[derive(Debug, Clone)]
pub struct Session {
    retention: usize,
    history: VecDeque<SearchHistoryEntry>,
    recommendations: VecDeque<RecommendationRecord>,
}

impl Session {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Session {
            retention,
            history: VecDeque::with_capacity(retention),
            recommendations: VecDeque::with_capacity(retention),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn record(&mut self, query: QueryKind, results: Vec<ResultRecord>) {
        let at = Utc::now();

        if self.history.len() == self.retention {
            self.history.pop_front();
        }
        self.history.push_back(SearchHistoryEntry {
            query: query.clone(),
            at,
        });

        if self.recommendations.len() == self.retention {
            self.recommendations.pop_front();
        }
        self.recommendations.push_back(RecommendationRecord { query, results, at });
    }

    /// Newest first.
    pub fn history(&self) -> impl Iterator<Item = &SearchHistoryEntry> {
        self.history.iter().rev()
    }

    /// Newest first.
    pub fn recommendations(&self) -> impl Iterator<Item = &RecommendationRecord> {
        self.recommendations.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.recommendations.clear();
    }
}
