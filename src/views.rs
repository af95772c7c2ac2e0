//! Category- and brand-scoped product views.
//!
//! These answer the navigation questions the UI asks:
//!
//! - [`category_catalog`]: which products, across all brands or one brand,
//!   belong to universal category X? Reads brand files directly (bypassing
//!   the loader's caches) and recomputes from scratch on every call.
//! - [`brand_catalog`]: one brand's products grouped into the fixed galaxy /
//!   spectrum layout.
//! - [`CategoryScope`]: a `(category, brand)` selection with observable
//!   `{products, loading}` state.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::consolidator::{self, Consolidation};
use crate::error::Result;
use crate::loader::{self, CatalogLoader};
use crate::models::{BrandEntry, CatalogProduct, Product};
use crate::source::DataSource;
use crate::taxonomy::{self, ALL};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCatalog {
    pub category: String,
    pub brand: Option<String>,
    pub products: Vec<CatalogProduct>,
}

fn is_all(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(ALL)
}

/// Products whose consolidated galaxy or spectrum equals `category`
/// (case-insensitive), across every brand in the index or just `brand_id`.
/// `"All"` disables the category filter.
///
/// Brand files are fetched concurrently. A brand that fails to fetch or
/// parse contributes nothing. Only an unreadable index is an error.
pub async fn category_catalog(
    source: Arc<dyn DataSource>,
    index_path: &str,
    category: &str,
    brand_id: Option<&str>,
) -> Result<CategoryCatalog> {
    let index = loader::fetch_index(source.as_ref(), index_path).await?;

    let entries: Vec<BrandEntry> = match brand_id {
        Some(id) => index.brands.iter().filter(|b| b.id == id).cloned().collect(),
        None => index.brands.clone(),
    };
    if entries.is_empty() {
        if let Some(id) = brand_id {
            log::warn!("Brand '{}' is not listed in {}", id, index_path);
        }
    }

    let mut tasks = JoinSet::new();
    for (pos, entry) in entries.iter().cloned().enumerate() {
        let source = source.clone();
        tasks.spawn(async move {
            let result = loader::fetch_brand(source.as_ref(), &entry).await;
            (pos, entry, result)
        });
    }

    let mut per_brand: Vec<Vec<CatalogProduct>> = vec![Vec::new(); entries.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((pos, entry, Ok(catalog))) => {
                let brand_name = loader::brand_display_name(&entry, &catalog);
                per_brand[pos] = catalog
                    .products
                    .into_iter()
                    .map(|product| CatalogProduct {
                        brand_id: entry.id.clone(),
                        brand_name: brand_name.clone(),
                        product,
                    })
                    .collect();
            }
            Ok((_, entry, Err(e))) => {
                log::warn!("Category view: skipping brand '{}': {}", entry.id, e);
            }
            Err(e) => log::warn!("Category view: brand task failed: {}", e),
        }
    }

    let wanted = category.trim();
    let products = per_brand
        .into_iter()
        .flatten()
        .filter(|p| is_all(wanted) || consolidator::consolidate_product(&p.product).matches(wanted))
        .collect();

    Ok(CategoryCatalog {
        category: wanted.to_string(),
        brand: brand_id.map(str::to_string),
        products,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SpectrumGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalaxyGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub spectra: Vec<SpectrumGroup>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandView {
    pub brand_id: String,
    pub brand_name: String,
    /// Always every galaxy, in taxonomy order, even when empty.
    pub galaxies: Vec<GalaxyGroup>,
}

/// Group products into the full galaxy/spectrum skeleton.
pub fn group_by_galaxy<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<GalaxyGroup> {
    let mut groups: Vec<GalaxyGroup> = taxonomy::galaxies()
        .iter()
        .map(|g| GalaxyGroup {
            id: g.id,
            label: g.label,
            color: g.color,
            spectra: g
                .spectra
                .iter()
                .map(|s| SpectrumGroup {
                    id: s.id,
                    label: s.label,
                    products: Vec::new(),
                })
                .collect(),
            total: 0,
        })
        .collect();

    for product in products {
        let Consolidation { galaxy, spectrum } = consolidator::consolidate_product(product);
        let Some(group) = groups.iter_mut().find(|g| g.id == galaxy) else {
            continue;
        };
        if let Some(slot) = group.spectra.iter_mut().find(|s| s.id == spectrum) {
            slot.products.push(product.clone());
            group.total += 1;
        }
    }
    groups
}

/// One brand's catalog through the loader (cached), grouped by galaxy.
pub async fn brand_catalog(loader: &CatalogLoader, brand_id: &str) -> Result<BrandView> {
    let catalog = loader.load_brand(brand_id).await?;
    Ok(BrandView {
        brand_id: catalog.identity.id.clone(),
        brand_name: catalog.identity.name.clone(),
        galaxies: group_by_galaxy(&catalog.products),
    })
}

// ============ Observable selection ============

#[derive(Debug, Clone, Default)]
pub struct CatalogViewState {
    pub category: String,
    pub brand: Option<String>,
    pub products: Vec<CatalogProduct>,
    pub loading: bool,
}

/// Tracks the current `(category, brand)` selection and publishes
/// `{products, loading}` to subscribers. Every selection recomputes fully.
pub struct CategoryScope {
    source: Arc<dyn DataSource>,
    index_path: String,
    state: watch::Sender<CatalogViewState>,
}

impl CategoryScope {
    pub fn new(source: Arc<dyn DataSource>, index_path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(CatalogViewState::default());
        Self {
            source,
            index_path: index_path.into(),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogViewState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> CatalogViewState {
        self.state.borrow().clone()
    }

    /// Switch to `(category, brand)`: publish `loading = true`, recompute,
    /// then publish the products. An index failure publishes an empty list.
    pub async fn select(&self, category: &str, brand: Option<&str>) -> CatalogViewState {
        self.state.send_modify(|s| {
            s.category = category.to_string();
            s.brand = brand.map(str::to_string);
            s.loading = true;
        });

        let view =
            category_catalog(self.source.clone(), &self.index_path, category, brand).await;
        let products = match view {
            Ok(view) => view.products,
            Err(e) => {
                log::warn!("Category view '{}' failed: {}", category, e);
                Vec::new()
            }
        };

        let next = CatalogViewState {
            category: category.to_string(),
            brand: brand.map(str::to_string),
            products,
            loading: false,
        };
        self.state.send_replace(next.clone());
        next
    }
}
