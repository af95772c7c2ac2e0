//! Instant fuzzy search over the pre-built search index.
//!
//! The search index (`search_index.json`) is a flat list of
//! [`SearchItem`]s produced upstream, independent of the brand catalogs,
//! so it can be out of date relative to them until it is regenerated.
//!
//! # Scoring
//!
//! 1. Split the query into words; each word is a fuzzy atom.
//! 2. For each word, take the best `weight × score` across the fields
//!    (name > brand > keywords > category > subcategory > description).
//! 3. Sum over words. Items where no word matched are dropped.
//! 4. Apply brand/category filters, then normalize by the best remaining
//!    item: `relevance = score / best`.
//! 5. Keep items with `relevance >= 1 - threshold` (higher threshold =
//!    more recall).
//! 6. Sort by relevance (desc), label (asc), id (asc); truncate to limit.
//!
//! Queries shorter than `min_query_len` characters skip ranking and return
//! the first `limit` items (after filters) in index order.

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Matcher, Utf32String};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::config::SearchConfig;
use crate::error::{CatalogError, Result};
use crate::models::SearchItem;
use crate::schema;
use crate::source::DataSource;

/// Per-field weights for the combined score.
#[derive(Debug, Clone, Copy)]
pub struct FieldWeights {
    pub name: f64,
    pub brand: f64,
    pub keywords: f64,
    pub category: f64,
    pub subcategory: f64,
    pub description: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 3.0,
            brand: 2.0,
            keywords: 1.5,
            category: 1.0,
            subcategory: 0.8,
            description: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// `0.0` keeps only the best-scoring items; `1.0` keeps every match.
    pub threshold: f64,
    pub default_limit: usize,
    pub min_query_len: usize,
    pub weights: FieldWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            default_limit: cfg.default_limit,
            min_query_len: cfg.min_query_len,
            weights: FieldWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Falls back to the configured default limit.
    pub limit: Option<usize>,
    /// Brand id or display name, case-insensitive.
    pub brand: Option<String>,
    /// Category or subcategory, case-insensitive.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: SearchItem,
    /// Relevance in `[0, 1]`; `0` for unranked short-query results.
    pub score: f64,
}

struct Haystacks {
    name: Utf32String,
    brand: Utf32String,
    keywords: Utf32String,
    category: Utf32String,
    subcategory: Utf32String,
    description: Utf32String,
}

impl Haystacks {
    fn build(item: &SearchItem) -> Self {
        let brand = match &item.brand_name {
            Some(name) if !name.is_empty() => format!("{} {}", item.brand, name),
            _ => item.brand.clone(),
        };
        Self {
            name: Utf32String::from(item.label.as_str()),
            brand: Utf32String::from(brand.as_str()),
            keywords: Utf32String::from(item.keywords.join(" ").as_str()),
            category: Utf32String::from(item.category.as_str()),
            subcategory: Utf32String::from(item.subcategory.as_deref().unwrap_or("")),
            description: Utf32String::from(item.description.as_str()),
        }
    }
}

struct SearchIndex {
    items: Vec<SearchItem>,
    haystacks: Vec<Haystacks>,
}

pub struct InstantSearch {
    source: Arc<dyn DataSource>,
    path: String,
    settings: SearchSettings,
    index: RwLock<Option<Arc<SearchIndex>>>,
    init_lock: Mutex<()>,
}

impl InstantSearch {
    pub fn new(
        source: Arc<dyn DataSource>,
        path: impl Into<String>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            source,
            path: path.into(),
            settings,
            index: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    fn current(&self) -> Option<Arc<SearchIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Number of indexed items (0 until initialized).
    pub fn len(&self) -> usize {
        self.current().map(|i| i.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch and index `search_index.json` once. Failures are logged and
    /// leave the index empty; call again to retry.
    pub async fn initialize(&self) -> bool {
        match self.try_initialize().await {
            Ok(_) => true,
            Err(e) => {
                log::error!("Instant search unavailable: {}", e);
                false
            }
        }
    }

    /// Like [`initialize`](Self::initialize) but returns the error. Returns
    /// the number of indexed items.
    pub async fn try_initialize(&self) -> Result<usize> {
        let _guard = self.init_lock.lock().await;
        if let Some(index) = self.current() {
            return Ok(index.items.len());
        }

        let raw = self.source.fetch(&self.path).await?;
        schema::validate_search_index(&raw)?;
        let items: Vec<SearchItem> =
            serde_json::from_value(raw).map_err(|e| CatalogError::parse(&self.path, e))?;
        let count = items.len();
        self.install(items);
        log::info!("Instant search ready: {} items", count);
        Ok(count)
    }

    /// Replace the index with `items` directly.
    pub fn install(&self, items: Vec<SearchItem>) {
        let haystacks = items.iter().map(Haystacks::build).collect();
        let index = Arc::new(SearchIndex { items, haystacks });
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = Some(index);
    }

    /// Drop the index; the next `initialize` fetches again.
    pub fn reset(&self) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let Some(index) = self.current() else {
            return Vec::new();
        };
        let limit = options.limit.unwrap_or(self.settings.default_limit);
        let query = query.trim();

        if query.chars().count() < self.settings.min_query_len {
            return index
                .items
                .iter()
                .filter(|item| passes_filters(item, options))
                .take(limit)
                .map(|item| SearchHit {
                    item: item.clone(),
                    score: 0.0,
                })
                .collect();
        }

        let atoms: Vec<Atom> = query
            .split_whitespace()
            .map(|word| {
                Atom::new(
                    word,
                    CaseMatching::Ignore,
                    Normalization::Smart,
                    AtomKind::Fuzzy,
                    false,
                )
            })
            .collect();

        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let w = &self.settings.weights;

        let mut scored: Vec<(usize, f64)> = index
            .haystacks
            .iter()
            .enumerate()
            .filter(|(idx, _)| passes_filters(&index.items[*idx], options))
            .filter_map(|(idx, hay)| {
                let fields = [
                    (&hay.name, w.name),
                    (&hay.brand, w.brand),
                    (&hay.keywords, w.keywords),
                    (&hay.category, w.category),
                    (&hay.subcategory, w.subcategory),
                    (&hay.description, w.description),
                ];
                let total: f64 = atoms
                    .iter()
                    .map(|atom| {
                        fields
                            .iter()
                            .filter_map(|(haystack, weight)| {
                                atom.score(haystack.slice(..), &mut matcher)
                                    .map(|s| s as f64 * weight)
                            })
                            .fold(0.0, f64::max)
                    })
                    .sum();
                (total > 0.0).then_some((idx, total))
            })
            .collect();

        let best = scored.iter().map(|(_, s)| *s).fold(0.0, f64::max);
        if best <= 0.0 {
            return Vec::new();
        }
        let floor = 1.0 - self.settings.threshold;

        scored.retain(|(_, s)| s / best >= floor);
        scored.sort_by(|a, b| {
            let (ia, ib) = (&index.items[a.0], &index.items[b.0]);
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ia.label.cmp(&ib.label))
                .then_with(|| ia.id.cmp(&ib.id))
        });
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(idx, s)| SearchHit {
                item: index.items[idx].clone(),
                score: s / best,
            })
            .collect()
    }
}

fn passes_filters(item: &SearchItem, options: &SearchOptions) -> bool {
    if let Some(brand) = options.brand.as_deref() {
        let by_id = item.brand.eq_ignore_ascii_case(brand);
        let by_name = item
            .brand_name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(brand));
        if !by_id && !by_name {
            return false;
        }
    }
    if let Some(category) = options.category.as_deref() {
        let by_category = item.category.eq_ignore_ascii_case(category);
        let by_sub = item
            .subcategory
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(category));
        if !by_category && !by_sub {
            return false;
        }
    }
    true
}
