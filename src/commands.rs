//! Command implementations behind the `halilit` CLI.
//!
//! Each `run_*` function builds what it needs from the [`Config`], prints
//! plain-text results to stdout, and returns an error for the CLI to report.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::consolidator;
use crate::loader::{self, CatalogLoader};
use crate::schema;
use crate::search::{InstantSearch, SearchOptions, SearchSettings};
use crate::source::{self, DataSource};
use crate::subjective::{self, SubjectiveStore};
use crate::taxonomy;
use crate::views;

fn loader_for(config: &Config) -> Result<CatalogLoader> {
    let source = source::source_from_config(&config.data)?;
    Ok(CatalogLoader::new(source, config.data.index_file.clone()))
}

pub async fn run_brands(config: &Config) -> Result<()> {
    let loader = loader_for(config)?;
    let index = loader.load_index().await?;
    if index.brands.is_empty() {
        println!("No brands.");
        return Ok(());
    }
    println!("{:<20} {:<28} {:>8} {:>8}", "ID", "NAME", "PRODUCTS", "VERIFIED");
    for brand in &index.brands {
        println!(
            "{:<20} {:<28} {:>8} {:>8}",
            brand.id, brand.name, brand.product_count, brand.verified_count
        );
    }
    Ok(())
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let loader = loader_for(config)?;
    loader.load_index().await?;
    let stats = loader.get_stats();
    println!("source:          {}", loader.source().describe());
    println!("brands:          {}", stats.total_brands);
    println!("products:        {}", stats.total_products);
    println!("verified:        {}", stats.total_verified);
    println!(
        "version:         {}",
        stats.version.as_deref().unwrap_or("-")
    );
    println!(
        "built:           {}",
        stats.build_timestamp.as_deref().unwrap_or("-")
    );
    Ok(())
}

pub async fn run_brand(config: &Config, brand_id: &str) -> Result<()> {
    let loader = loader_for(config)?;
    let catalog = loader.load_brand(brand_id).await?;

    println!("--- {} ({}) ---", catalog.identity.name, catalog.identity.id);
    if let Some(website) = &catalog.identity.website {
        println!("website:      {}", website);
    }
    println!("products:     {}", catalog.stats.total_products);
    println!("verified:     {}", catalog.stats.verified_products);
    println!("with images:  {}", catalog.stats.with_images);
    println!("with pricing: {}", catalog.stats.with_pricing);
    println!();

    for product in &catalog.products {
        let target = consolidator::consolidate_product(product);
        println!(
            "{:<16} {:<40} {}/{}",
            product.id, product.name, target.galaxy, target.spectrum
        );
    }
    Ok(())
}

pub async fn run_category(config: &Config, category: &str, brand: Option<&str>) -> Result<()> {
    let source: Arc<dyn DataSource> = source::source_from_config(&config.data)?;
    let view = views::category_catalog(source, &config.data.index_file, category, brand).await?;
    if view.products.is_empty() {
        println!("No products.");
        return Ok(());
    }
    for item in &view.products {
        println!(
            "{:<16} {:<16} {}",
            item.brand_id, item.product.id, item.product.name
        );
    }
    println!();
    println!("{} products in '{}'", view.products.len(), view.category);
    Ok(())
}

pub async fn run_search(
    config: &Config,
    query: &str,
    brand: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    if limit == Some(0) {
        bail!("--limit must be at least 1");
    }
    let source = source::source_from_config(&config.data)?;
    let search = InstantSearch::new(
        source,
        config.data.search_index_file.clone(),
        SearchSettings::from(&config.search),
    );
    search.try_initialize().await?;

    let hits = search.search(
        query,
        &SearchOptions {
            limit,
            brand,
            category,
        },
    );
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} / {} ({})",
            i + 1,
            hit.score,
            hit.item.brand,
            hit.item.label,
            hit.item.category
        );
        println!("    id: {}", hit.item.id);
    }
    Ok(())
}

pub fn run_galaxies() {
    for galaxy in taxonomy::galaxies() {
        println!("{:<14} {}", galaxy.id, galaxy.label);
        for spectrum in galaxy.spectra {
            println!("  {:<24} {}", spectrum.id, spectrum.label);
        }
    }
}

/// Fetch and validate every catalog file. Fails if any file is invalid.
pub async fn run_validate(config: &Config) -> Result<()> {
    let source = source::source_from_config(&config.data)?;
    let index = loader::fetch_index(source.as_ref(), &config.data.index_file).await?;
    println!("OK    {}", config.data.index_file);

    let mut failures = 0usize;
    for entry in &index.brands {
        match loader::fetch_brand(source.as_ref(), entry).await {
            Ok(catalog) => println!(
                "OK    {} ({} products)",
                entry.data_file,
                catalog.products.len()
            ),
            Err(e) => {
                failures += 1;
                println!("FAIL  {}: {}", entry.data_file, e);
            }
        }
    }

    let search_path = &config.data.search_index_file;
    match source.fetch(search_path).await {
        Ok(raw) => match schema::validate_search_index(&raw) {
            Ok(()) => println!("OK    {}", search_path),
            Err(e) => {
                failures += 1;
                println!("FAIL  {}: {}", search_path, e);
            }
        },
        Err(e) => {
            failures += 1;
            println!("FAIL  {}: {}", search_path, e);
        }
    }

    let total = index.brands.len() + 2;
    if failures > 0 {
        bail!("{} of {} files failed validation", failures, total);
    }
    println!();
    println!("All {} files valid.", total);
    Ok(())
}

/// Edits to one product's subjective fields.
#[derive(Debug, Default)]
pub struct NoteEdit {
    pub rating: Option<u8>,
    pub clear_rating: bool,
    pub tags: Vec<String>,
    pub untag: Vec<String>,
    pub notes: Option<String>,
    pub clear: bool,
}

pub async fn run_note(
    config: &Config,
    brand_id: &str,
    product_id: &str,
    edit: NoteEdit,
) -> Result<()> {
    let loader = loader_for(config)?;
    let product = loader.find_product(brand_id, product_id).await?;

    let key = subjective::product_key(brand_id, &product.id);
    let mut store = SubjectiveStore::open(&config.subjective.path)?;
    if edit.clear {
        store.clear(&key);
    }
    if edit.clear_rating || edit.rating.is_some() {
        store.set_rating(&key, edit.rating)?;
    }
    for tag in &edit.tags {
        store.add_tag(&key, tag);
    }
    for tag in &edit.untag {
        store.remove_tag(&key, tag);
    }
    if let Some(notes) = &edit.notes {
        store.set_notes(&key, notes);
    }
    store.save()?;

    println!("--- {} ---", product.name);
    match store.get(&key) {
        Some(fields) => {
            let rating = fields
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("rating: {}", rating);
            println!("tags:   {}", fields.tags.join(", "));
            println!("notes:  {}", fields.notes);
        }
        None => println!("(no notes)"),
    }
    Ok(())
}
