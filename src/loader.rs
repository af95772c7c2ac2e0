//! Fetching, validating, caching and normalizing catalog JSON.
//!
//! [`CatalogLoader`] is the single point of truth for the master index and
//! per-brand catalogs. It is an explicit object: construct one per data
//! source and hand it to whoever needs it (CLI, HTTP server, tests).
//!
//! # Caching
//!
//! | Cache | Filled by | Cleared by |
//! |-------|-----------|------------|
//! | master index | [`load_index`](CatalogLoader::load_index) | [`clear_cache`](CatalogLoader::clear_cache) |
//! | brand catalogs (by id) | [`load_brand`](CatalogLoader::load_brand), [`load_all_products`](CatalogLoader::load_all_products) | `clear_cache` |
//! | all-products aggregate | `load_all_products` | `clear_cache` |
//!
//! # Failures
//!
//! `load_index` and `load_brand` return the first error, with no retry.
//! `load_all_products` tolerates individual brand failures (logged and
//! skipped) but not an index failure.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::error::{CatalogError, Result};
use crate::models::{BrandCatalog, BrandEntry, CatalogProduct, MasterIndex, Product};
use crate::normalize;
use crate::schema;
use crate::source::DataSource;

/// Read-only summary of what the index declares and what is loaded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogStats {
    pub total_brands: usize,
    pub total_products: u64,
    pub total_verified: u64,
    pub build_timestamp: Option<String>,
    pub version: Option<String>,
    pub loaded_brands: usize,
    pub loaded_products: usize,
}

pub struct CatalogLoader {
    source: Arc<dyn DataSource>,
    index_path: String,
    index: RwLock<Option<Arc<MasterIndex>>>,
    brands: RwLock<HashMap<String, Arc<BrandCatalog>>>,
    /// Held for the whole aggregate load, so concurrent callers queue on
    /// the lock and then read the cached result.
    all_products: Mutex<Option<Arc<Vec<CatalogProduct>>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Fetch one brand file and normalize it. Shared with the category views,
/// which bypass the loader's caches.
pub async fn fetch_brand(source: &dyn DataSource, entry: &BrandEntry) -> Result<BrandCatalog> {
    let raw = source.fetch(&entry.data_file).await?;
    let catalog = normalize::parse_brand(&entry.data_file, raw)?;
    if catalog.identity.id != entry.id {
        log::warn!(
            "{} declares brand id '{}' but the index lists it as '{}'",
            entry.data_file,
            catalog.identity.id,
            entry.id
        );
    }
    Ok(catalog)
}

/// The brand file's own name, or the index entry's when that is empty.
pub fn brand_display_name(entry: &BrandEntry, catalog: &BrandCatalog) -> String {
    if catalog.identity.name.trim().is_empty() {
        entry.name.clone()
    } else {
        catalog.identity.name.clone()
    }
}

/// Fetch and validate a master index without caching it.
pub async fn fetch_index(source: &dyn DataSource, path: &str) -> Result<MasterIndex> {
    let raw = source.fetch(path).await?;
    schema::validate_index(&raw)?;
    serde_json::from_value(raw).map_err(|e| CatalogError::parse(path, e))
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn DataSource>, index_path: impl Into<String>) -> Self {
        Self {
            source,
            index_path: index_path.into(),
            index: RwLock::new(None),
            brands: RwLock::new(HashMap::new()),
            all_products: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// Fetch the master index once; later calls return the cached copy.
    pub async fn load_index(&self) -> Result<Arc<MasterIndex>> {
        if let Some(index) = read(&self.index).as_ref() {
            return Ok(index.clone());
        }

        let index = Arc::new(fetch_index(self.source.as_ref(), &self.index_path).await?);
        log::debug!(
            "Loaded master index: {} brands from {}",
            index.brands.len(),
            self.source.describe()
        );
        *write(&self.index) = Some(index.clone());
        Ok(index)
    }

    /// Load one brand's catalog, from cache when possible.
    ///
    /// Loads the index first if it is not cached yet. Returns
    /// [`CatalogError::NotFound`] when the index does not list `brand_id`.
    pub async fn load_brand(&self, brand_id: &str) -> Result<Arc<BrandCatalog>> {
        if let Some(catalog) = self.get_brand(brand_id) {
            log::debug!("Brand cache hit: {}", brand_id);
            return Ok(catalog);
        }

        let index = self.load_index().await?;
        let entry = index
            .brand(brand_id)
            .ok_or_else(|| CatalogError::NotFound(format!("brand '{}'", brand_id)))?;

        let catalog = Arc::new(fetch_brand(self.source.as_ref(), entry).await?);
        write(&self.brands).insert(brand_id.to_string(), catalog.clone());
        Ok(catalog)
    }

    /// Every product of every brand in the index, tagged with its brand.
    ///
    /// Brands are fetched concurrently. A brand that fails to load is logged
    /// and contributes nothing. Ordering is index order, then each brand's
    /// own (name-sorted) order.
    pub async fn load_all_products(&self) -> Result<Arc<Vec<CatalogProduct>>> {
        let mut aggregate = self.all_products.lock().await;
        if let Some(products) = aggregate.as_ref() {
            return Ok(products.clone());
        }

        let index = self.load_index().await?;
        let mut slots: Vec<Option<Arc<BrandCatalog>>> = vec![None; index.brands.len()];

        let mut tasks = JoinSet::new();
        for (pos, entry) in index.brands.iter().enumerate() {
            if let Some(cached) = self.get_brand(&entry.id) {
                slots[pos] = Some(cached);
                continue;
            }
            let source = self.source.clone();
            let entry = entry.clone();
            tasks.spawn(async move {
                let result = fetch_brand(source.as_ref(), &entry).await;
                (pos, entry, result)
            });
        }

        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((pos, entry, Ok(catalog))) => {
                    let catalog = Arc::new(catalog);
                    write(&self.brands).insert(entry.id.clone(), catalog.clone());
                    slots[pos] = Some(catalog);
                }
                Ok((_, entry, Err(e))) => {
                    failed += 1;
                    log::warn!("Skipping brand '{}': {}", entry.id, e);
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("Brand load task failed: {}", e);
                }
            }
        }

        let products: Vec<CatalogProduct> = index
            .brands
            .iter()
            .zip(slots)
            .filter_map(|(entry, slot)| slot.map(|catalog| (entry, catalog)))
            .flat_map(|(entry, catalog)| {
                let brand_name = brand_display_name(entry, &catalog);
                catalog
                    .products
                    .iter()
                    .map(|p| CatalogProduct {
                        brand_id: entry.id.clone(),
                        brand_name: brand_name.clone(),
                        product: p.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        log::info!(
            "Loaded {} products from {} brands ({} failed)",
            products.len(),
            index.brands.len() - failed,
            failed
        );

        let products = Arc::new(products);
        *aggregate = Some(products.clone());
        Ok(products)
    }

    /// Cached catalog for `brand_id`, without I/O.
    pub fn get_brand(&self, brand_id: &str) -> Option<Arc<BrandCatalog>> {
        read(&self.brands).get(brand_id).cloned()
    }

    pub fn cached_brand_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.brands).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Brand entries from the cached index; empty until `load_index` ran.
    pub fn get_brands(&self) -> Vec<BrandEntry> {
        read(&self.index)
            .as_ref()
            .map(|index| index.brands.clone())
            .unwrap_or_default()
    }

    pub fn get_stats(&self) -> CatalogStats {
        let brands = read(&self.brands);
        let loaded_products = brands.values().map(|c| c.products.len()).sum();
        let loaded_brands = brands.len();
        drop(brands);

        match read(&self.index).as_ref() {
            Some(index) => CatalogStats {
                total_brands: index.brands.len(),
                total_products: index.total_products,
                total_verified: index.total_verified,
                build_timestamp: index.build_timestamp.clone(),
                version: index.version.clone(),
                loaded_brands,
                loaded_products,
            },
            None => CatalogStats {
                loaded_brands,
                loaded_products,
                ..Default::default()
            },
        }
    }

    /// Find one product by brand and product id, loading the brand if needed.
    pub async fn find_product(&self, brand_id: &str, product_id: &str) -> Result<Product> {
        let catalog = self.load_brand(brand_id).await?;
        catalog
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| {
                CatalogError::NotFound(format!("product '{}' in brand '{}'", product_id, brand_id))
            })
    }

    /// Drop the index, every brand catalog and the aggregate.
    pub async fn clear_cache(&self) {
        let mut aggregate = self.all_products.lock().await;
        *aggregate = None;
        *write(&self.index) = None;
        write(&self.brands).clear();
        log::debug!("Catalog cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::{json, Value};

    fn index() -> Value {
        json!({
            "build_timestamp": "2025-03-01T10:00:00Z",
            "version": 4,
            "total_products": 3,
            "total_verified": 3,
            "brands": [
                { "id": "roland", "name": "Roland", "product_count": 2, "data_file": "roland.json" },
                { "id": "nord", "name": "Nord", "product_count": 1, "data_file": "nord.json" }
            ]
        })
    }

    fn roland() -> Value {
        json!({
            "brand_identity": { "id": "roland", "name": "Roland" },
            "products": [
                { "id": "r2", "name": "Juno-X", "category": "Synthesizers", "images": ["juno.jpg"] },
                { "id": "r1", "name": "FP-30X", "category": "Digital Pianos" }
            ]
        })
    }

    fn nord() -> Value {
        json!({
            "brand_identity": { "id": "nord", "name": "Nord" },
            "products": [{ "id": "n1", "name": "Stage 4", "category": "Digital Piano" }]
        })
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with("index.json", index())
                .with("roland.json", roland())
                .with("nord.json", nord()),
        )
    }

    #[tokio::test]
    async fn test_load_index_caches() {
        let src = source();
        let loader = CatalogLoader::new(src.clone(), "index.json");
        let a = loader.load_index().await.unwrap();
        let b = loader.load_index().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(src.fetch_count("index.json"), 1);
        assert_eq!(a.version.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_load_index_rejects_bad_shape() {
        let src = Arc::new(MemorySource::new().with("index.json", json!({ "brands": "nope" })));
        let loader = CatalogLoader::new(src, "index.json");
        let err = loader.load_index().await.unwrap_err();
        assert!(err.is_validation(), "{}", err);
    }

    #[tokio::test]
    async fn test_load_brand_sorted_and_cached() {
        let src = source();
        let loader = CatalogLoader::new(src.clone(), "index.json");
        let catalog = loader.load_brand("roland").await.unwrap();
        let names: Vec<&str> = catalog.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["FP-30X", "Juno-X"]);
        assert_eq!(catalog.products[1].image_url, "juno.jpg");

        loader.load_brand("roland").await.unwrap();
        assert_eq!(src.fetch_count("roland.json"), 1);
    }

    #[tokio::test]
    async fn test_load_brand_unknown_id_is_not_found() {
        let loader = CatalogLoader::new(source(), "index.json");
        let err = loader.load_brand("yamaha").await.unwrap_err();
        assert!(err.is_not_found(), "{}", err);
    }

    #[tokio::test]
    async fn test_load_all_tolerates_broken_brand() {
        let src = Arc::new(
            MemorySource::new()
                .with("index.json", index())
                .with("roland.json", roland())
                .with(
                    "nord.json",
                    json!({ "brand_identity": { "name": "Nord" }, "products": [] }),
                ),
        );
        let loader = CatalogLoader::new(src, "index.json");

        assert!(loader.load_brand("nord").await.unwrap_err().is_validation());

        let all = loader.load_all_products().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.brand_id == "roland"));
    }

    #[tokio::test]
    async fn test_load_all_index_failure_is_fatal() {
        let loader = CatalogLoader::new(Arc::new(MemorySource::new()), "index.json");
        assert!(loader.load_all_products().await.is_err());
    }

    #[tokio::test]
    async fn test_load_all_index_order_and_tags() {
        let loader = CatalogLoader::new(source(), "index.json");
        let all = loader.load_all_products().await.unwrap();
        let ids: Vec<(&str, &str)> = all
            .iter()
            .map(|p| (p.brand_id.as_str(), p.product.id.as_str()))
            .collect();
        assert_eq!(ids, vec![("roland", "r1"), ("roland", "r2"), ("nord", "n1")]);
        assert_eq!(all[2].brand_name, "Nord");
    }

    #[tokio::test]
    async fn test_concurrent_load_all_shares_one_load() {
        let src = source();
        let loader = Arc::new(CatalogLoader::new(src.clone(), "index.json"));
        let (a, b) = tokio::join!(loader.load_all_products(), loader.load_all_products());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(src.fetch_count("index.json"), 1);
        assert_eq!(src.fetch_count("roland.json"), 1);
        assert_eq!(src.fetch_count("nord.json"), 1);
    }

    #[tokio::test]
    async fn test_load_all_reuses_cached_brands() {
        let src = source();
        let loader = CatalogLoader::new(src.clone(), "index.json");
        loader.load_brand("nord").await.unwrap();
        loader.load_all_products().await.unwrap();
        assert_eq!(src.fetch_count("nord.json"), 1);
    }

    #[tokio::test]
    async fn test_stats_and_clear_cache() {
        let src = source();
        let loader = CatalogLoader::new(src.clone(), "index.json");
        assert_eq!(loader.get_stats().total_brands, 0);
        assert!(loader.get_brands().is_empty());

        loader.load_all_products().await.unwrap();
        let stats = loader.get_stats();
        assert_eq!(stats.total_brands, 2);
        assert_eq!(stats.loaded_brands, 2);
        assert_eq!(stats.loaded_products, 3);
        assert_eq!(loader.cached_brand_ids(), vec!["nord", "roland"]);

        loader.clear_cache().await;
        assert!(loader.get_brand("roland").is_none());
        assert_eq!(loader.get_stats().loaded_brands, 0);

        loader.load_all_products().await.unwrap();
        assert_eq!(src.fetch_count("index.json"), 2);
    }

    #[tokio::test]
    async fn test_find_product() {
        let loader = CatalogLoader::new(source(), "index.json");
        let p = loader.find_product("nord", "n1").await.unwrap();
        assert_eq!(p.name, "Stage 4");
        assert!(loader.find_product("nord", "zz").await.unwrap_err().is_not_found());
    }
}
