//! Raw brand JSON → canonical [`Product`] / [`BrandCatalog`].
//!
//! Brand files come from different scrapers and disagree on nearly every
//! substructure. Normalization guarantees:
//!
//! - `images` is always present (possibly all-empty), whatever the source
//!   layout (string, array of strings, array of `{url, type}`, or
//!   `{main, thumbnail, gallery}`).
//! - `image_url` is resolved through a fixed fallback chain.
//! - `category` is never empty (`"Uncategorized"` as a last resort).
//! - `verified` defaults to `true`.
//! - Catalog products are sorted by name for deterministic ordering.

use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::models::{
    Availability, BrandCatalog, BrandStats, Manual, Pricing, Product, ProductImages, RawBrandFile,
    RawImageEntry, RawImages, RawManual, RawPricing, RawProduct, RawRelationship,
    RawSpecifications, Relationship, Specification,
};
use crate::schema;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const DEFAULT_CURRENCY: &str = "ILS";

/// Normalize any supported image layout into `{main, thumbnail, gallery}`.
///
/// For list layouts the first entry typed `main` wins the main slot (the
/// first entry otherwise) and the first entry typed `thumbnail` wins the
/// thumbnail slot. Every other URL lands in `gallery`, in source order,
/// without duplicates.
pub fn transform_images(raw: Option<&RawImages>) -> ProductImages {
    let mut images = ProductImages::default();

    match raw {
        None | Some(RawImages::Other(_)) => {}
        Some(RawImages::Single(url)) => {
            images.main = url.trim().to_string();
        }
        Some(RawImages::List(entries)) => {
            for entry in entries {
                let Some(url) = entry.url() else {
                    continue;
                };
                let kind = entry.kind().map(|k| k.to_lowercase());
                match kind.as_deref() {
                    Some("main") | Some("primary") | Some("hero") if images.main.is_empty() => {
                        images.main = url.to_string();
                    }
                    Some("thumbnail") | Some("thumb") if images.thumbnail.is_empty() => {
                        images.thumbnail = url.to_string();
                    }
                    _ => push_unique(&mut images.gallery, url),
                }
            }
            if images.main.is_empty() && !images.gallery.is_empty() {
                images.main = images.gallery.remove(0);
            }
        }
        Some(RawImages::Object(obj)) => {
            images.main = obj.main.clone().unwrap_or_default();
            images.thumbnail = obj.thumbnail.clone().unwrap_or_default();
            for url in obj.gallery.iter().filter_map(RawImageEntry::url) {
                push_unique(&mut images.gallery, url);
            }
            if images.main.is_empty() {
                images.main = if !images.thumbnail.is_empty() {
                    images.thumbnail.clone()
                } else {
                    images.gallery.first().cloned().unwrap_or_default()
                };
            }
        }
    }

    if images.thumbnail.is_empty() {
        images.thumbnail = images.main.clone();
    }
    images
}

fn push_unique(list: &mut Vec<String>, url: &str) {
    if !list.iter().any(|u| u == url) {
        list.push(url.to_string());
    }
}

/// Resolve the single primary image:
/// `image_url` → `images.main` → `images.thumbnail` → first gallery image → `""`.
pub fn extract_image_url(explicit: Option<&str>, images: &ProductImages) -> String {
    explicit
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| Some(images.main.as_str()).filter(|u| !u.is_empty()))
        .or_else(|| Some(images.thumbnail.as_str()).filter(|u| !u.is_empty()))
        .or_else(|| images.gallery.first().map(String::as_str))
        .unwrap_or_default()
        .to_string()
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn transform_pricing(raw: Option<&RawPricing>, flat_price: Option<f64>) -> Option<Pricing> {
    let pricing = raw.cloned().unwrap_or_default();
    let regular_price = pricing.regular_price.or(flat_price);
    if regular_price.is_none() && pricing.eilat_price.is_none() && pricing.sale_price.is_none() {
        return None;
    }
    Some(Pricing {
        regular_price,
        eilat_price: pricing.eilat_price,
        sale_price: pricing.sale_price,
        currency: pricing
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    })
}

fn spec_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn transform_specifications(raw: Option<&RawSpecifications>) -> Vec<Specification> {
    match raw {
        Some(RawSpecifications::List(list)) => list
            .iter()
            .map(|s| Specification {
                key: s.key.clone(),
                value: spec_value(&s.value),
                category: non_empty(s.category.as_ref()),
            })
            .collect(),
        Some(RawSpecifications::Map(map)) => map
            .iter()
            .map(|(k, v)| Specification {
                key: k.clone(),
                value: spec_value(v),
                category: None,
            })
            .collect(),
        Some(RawSpecifications::Other(_)) | None => Vec::new(),
    }
}

fn transform_manuals(raw: &[RawManual]) -> Vec<Manual> {
    raw.iter()
        .filter_map(|m| match m {
            RawManual::Url(url) => Some(Manual {
                url: url.clone(),
                ..Default::default()
            }),
            RawManual::Entry(manual) => Some(manual.clone()),
        })
        .filter(|m| !m.url.is_empty())
        .collect()
}

fn transform_relationships(raw: &[RawRelationship]) -> Vec<Relationship> {
    raw.iter()
        .map(|r| match r {
            RawRelationship::Name(name) => Relationship {
                name: Some(name.clone()),
                ..Default::default()
            },
            RawRelationship::Entry(rel) => rel.clone(),
        })
        .filter(|r| r.id.is_some() || r.name.is_some())
        .collect()
}

/// Normalize one raw product belonging to `brand_id`.
pub fn transform_product(raw: &RawProduct, brand_id: &str) -> Product {
    let images = transform_images(raw.images.as_ref());
    let image_url = extract_image_url(raw.image_url.as_deref(), &images);

    let category = non_empty(raw.category.as_ref())
        .or_else(|| non_empty(raw.main_category.as_ref()))
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    Product {
        id: raw.id.clone(),
        name: raw.name.trim().to_string(),
        brand: brand_id.to_string(),
        category,
        main_category: non_empty(raw.main_category.as_ref()),
        subcategory: non_empty(raw.subcategory.as_ref()),
        description: non_empty(raw.description.as_ref())
            .or_else(|| non_empty(raw.short_description.as_ref()))
            .unwrap_or_default(),
        pricing: transform_pricing(raw.pricing.as_ref(), raw.price),
        images,
        image_url,
        specifications: transform_specifications(raw.specifications.as_ref()),
        manuals: transform_manuals(&raw.manuals),
        accessories: transform_relationships(&raw.accessories),
        related: transform_relationships(&raw.related),
        availability: raw
            .availability
            .as_deref()
            .map(Availability::from_raw)
            .unwrap_or_default(),
        verified: raw.verified.unwrap_or(true),
    }
}

/// Deterministic catalog order: name (case-insensitive), then id.
pub fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn transform_brand(file: RawBrandFile) -> BrandCatalog {
    let brand_id = file.brand_identity.id.clone();
    let mut products: Vec<Product> = file
        .products
        .iter()
        .map(|p| transform_product(p, &brand_id))
        .collect();
    sort_products(&mut products);

    let stats = BrandStats::from_products(&products);
    BrandCatalog {
        identity: file.brand_identity,
        products,
        stats,
        declared_stats: file.stats,
    }
}

/// Validate raw brand JSON and decode it. `label` names the file in errors.
pub fn decode_brand(label: &str, value: Value) -> Result<RawBrandFile> {
    schema::validate_brand(label, &value)?;
    serde_json::from_value(value).map_err(|e| CatalogError::parse(label, e))
}

/// Validate, decode and normalize in one step.
pub fn parse_brand(label: &str, value: Value) -> Result<BrandCatalog> {
    decode_brand(label, value).map(transform_brand)
}
