//! Core data models used throughout the catalog.
//!
//! Two layers live here: the *raw* shapes that mirror the static JSON files
//! (permissive, every field optional where the data is inconsistent across
//! brands) and the *canonical* shapes every consumer works with after
//! [`crate::normalize`] has run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============ Master index ============

/// Lightweight manifest listing every brand and where its catalog lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterIndex {
    #[serde(default, deserialize_with = "de::opt_lenient_string")]
    pub build_timestamp: Option<String>,
    #[serde(default, deserialize_with = "de::opt_lenient_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_verified: u64,
    pub brands: Vec<BrandEntry>,
}

impl MasterIndex {
    pub fn brand(&self, id: &str) -> Option<&BrandEntry> {
        self.brands.iter().find(|b| b.id == id)
    }
}

/// One brand entry in the master index. `product_count` is advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand_color: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub product_count: u64,
    #[serde(default)]
    pub verified_count: u64,
    pub data_file: String,
}

// ============ Brand file (raw) ============

/// A `<brand>.json` file as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBrandFile {
    pub brand_identity: BrandIdentity,
    #[serde(default)]
    pub products: Vec<RawProduct>,
    #[serde(default)]
    pub stats: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand_colors: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "de::null_as_empty")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    #[serde(deserialize_with = "de::lenient_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub main_category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Option<RawImages>,
    #[serde(default)]
    pub pricing: Option<RawPricing>,
    #[serde(default, deserialize_with = "de::opt_lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub specifications: Option<RawSpecifications>,
    #[serde(default, deserialize_with = "de::null_as_empty")]
    pub manuals: Vec<RawManual>,
    #[serde(default, deserialize_with = "de::null_as_empty")]
    pub accessories: Vec<RawRelationship>,
    #[serde(default, deserialize_with = "de::null_as_empty")]
    pub related: Vec<RawRelationship>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// Every image layout seen across brand files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImages {
    Single(String),
    List(Vec<RawImageEntry>),
    Object(RawImageObject),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImageEntry {
    Url(String),
    Object {
        #[serde(default, alias = "src")]
        url: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    Other(Value),
}

impl RawImageEntry {
    pub fn url(&self) -> Option<&str> {
        match self {
            RawImageEntry::Url(u) => Some(u.as_str()),
            RawImageEntry::Object { url, .. } => url.as_deref(),
            RawImageEntry::Other(_) => None,
        }
        .filter(|u| !u.is_empty())
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            RawImageEntry::Object { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageObject {
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_empty")]
    pub gallery: Vec<RawImageEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPricing {
    #[serde(default, deserialize_with = "de::opt_lenient_f64")]
    pub regular_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_lenient_f64")]
    pub eilat_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_lenient_f64")]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSpecifications {
    List(Vec<RawSpecification>),
    Map(BTreeMap<String, Value>),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpecification {
    #[serde(alias = "name", alias = "label")]
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawManual {
    Url(String),
    Entry(Manual),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRelationship {
    Name(String),
    Entry(Relationship),
}

// ============ Canonical product ============

/// Canonical catalog item. Every product has a non-null `images` and a
/// non-empty `category` after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub main_category: Option<String>,
    pub subcategory: Option<String>,
    pub description: String,
    pub pricing: Option<Pricing>,
    pub images: ProductImages,
    /// Primary image resolved through the fallback chain; may be empty.
    pub image_url: String,
    pub specifications: Vec<Specification>,
    pub manuals: Vec<Manual>,
    pub accessories: Vec<Relationship>,
    pub related: Vec<Relationship>,
    pub availability: Availability,
    pub verified: bool,
}

impl Product {
    /// Specifications grouped by their category (`"General"` when absent),
    /// in first-seen order.
    pub fn grouped_specifications(&self) -> Vec<(String, Vec<&Specification>)> {
        let mut groups: Vec<(String, Vec<&Specification>)> = Vec::new();
        for spec in &self.specifications {
            let group = spec.category.as_deref().unwrap_or("General");
            match groups.iter_mut().find(|(name, _)| name.as_str() == group) {
                Some((_, list)) => list.push(spec),
                None => groups.push((group.to_string(), vec![spec])),
            }
        }
        groups
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImages {
    pub main: String,
    pub thumbnail: String,
    pub gallery: Vec<String>,
}

impl ProductImages {
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.thumbnail.is_empty() && self.gallery.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub regular_price: Option<f64>,
    pub eilat_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub currency: String,
}

impl Pricing {
    /// Sale price when present, otherwise the regular price.
    pub fn effective_price(&self) -> Option<f64> {
        self.sale_price.or(self.regular_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub key: String,
    pub value: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manual {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Reference to another product by id, name, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "de::opt_lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    PreOrder,
    Discontinued,
    #[default]
    Unknown,
}

impl Availability {
    pub fn from_raw(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "instock" | "available" | "yes" => Availability::InStock,
            "outofstock" | "unavailable" | "soldout" => Availability::OutOfStock,
            "preorder" | "comingsoon" => Availability::PreOrder,
            "discontinued" | "eol" => Availability::Discontinued,
            _ => Availability::Unknown,
        }
    }
}

// ============ Brand catalog ============

/// One brand's normalized product set plus identity and counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandCatalog {
    pub identity: BrandIdentity,
    pub products: Vec<Product>,
    pub stats: BrandStats,
    /// The file's own `stats` block, kept as-is; it is not trusted for counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_stats: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandStats {
    pub total_products: usize,
    pub verified_products: usize,
    pub with_images: usize,
    pub with_pricing: usize,
    pub categories: BTreeMap<String, usize>,
}

impl BrandStats {
    pub fn from_products(products: &[Product]) -> Self {
        let mut stats = BrandStats {
            total_products: products.len(),
            ..Default::default()
        };
        for p in products {
            if p.verified {
                stats.verified_products += 1;
            }
            if !p.image_url.is_empty() {
                stats.with_images += 1;
            }
            if p.pricing.is_some() {
                stats.with_pricing += 1;
            }
            *stats.categories.entry(p.category.clone()).or_insert(0) += 1;
        }
        stats
    }
}

/// A product in a multi-brand view, tagged with its originating brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub brand_id: String,
    pub brand_name: String,
    #[serde(flatten)]
    pub product: Product,
}

// ============ Search documents ============

/// Flattened projection of a product built offline for instant search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(deserialize_with = "de::lenient_string")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

// ============ Lenient deserializers ============

/// Source files are hand-assembled from several scrapers, so ids show up as
/// numbers and prices as strings. These helpers accept both.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(v: Value) -> Option<String> {
        match v {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        value_to_string(v).ok_or_else(|| serde::de::Error::custom("expected string or number"))
    }

    pub fn opt_lenient_string<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(value_to_string(v))
    }

    /// `null` reads as an empty list.
    pub fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }

    pub fn opt_lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                cleaned.parse::<f64>().ok()
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_product_accepts_numeric_id_and_string_price() {
        let raw: RawProduct = serde_json::from_value(json!({
            "id": 1042,
            "name": "FP-30X",
            "price": "₪2,990.00",
            "pricing": { "regular_price": "3190", "currency": "ILS" }
        }))
        .unwrap();
        assert_eq!(raw.id, "1042");
        assert_eq!(raw.price, Some(2990.0));
        assert_eq!(raw.pricing.unwrap().regular_price, Some(3190.0));
    }

    #[test]
    fn test_raw_images_shapes() {
        let strings: RawImages = serde_json::from_value(json!(["a.jpg", "b.jpg"])).unwrap();
        assert!(matches!(strings, RawImages::List(ref v) if v.len() == 2));

        let objects: RawImages =
            serde_json::from_value(json!([{ "url": "a.jpg", "type": "main" }])).unwrap();
        match objects {
            RawImages::List(v) => {
                assert_eq!(v[0].url(), Some("a.jpg"));
                assert_eq!(v[0].kind(), Some("main"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let object: RawImages =
            serde_json::from_value(json!({ "main": "m.jpg", "gallery": ["g.jpg"] })).unwrap();
        assert!(matches!(object, RawImages::Object(_)));
    }

    #[test]
    fn test_availability_from_raw() {
        assert_eq!(Availability::from_raw("In Stock"), Availability::InStock);
        assert_eq!(Availability::from_raw("pre-order"), Availability::PreOrder);
        assert_eq!(Availability::from_raw("out_of_stock"), Availability::OutOfStock);
        assert_eq!(Availability::from_raw("???"), Availability::Unknown);
    }

    fn spec(key: &str, value: &str, category: Option<&str>) -> Specification {
        Specification {
            key: key.into(),
            value: value.into(),
            category: category.map(Into::into),
        }
    }

    #[test]
    fn test_grouped_specifications_preserve_order() {
        let product = Product {
            id: "1".into(),
            name: "TD-17".into(),
            brand: "roland".into(),
            category: "V-Drums".into(),
            main_category: None,
            subcategory: None,
            description: String::new(),
            pricing: None,
            images: ProductImages::default(),
            image_url: String::new(),
            specifications: vec![
                spec("Pads", "5", Some("Kit")),
                spec("Weight", "20kg", None),
                spec("Cymbals", "3", Some("Kit")),
            ],
            manuals: vec![],
            accessories: vec![],
            related: vec![],
            availability: Availability::Unknown,
            verified: true,
        };
        let groups = product.grouped_specifications();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Kit");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "General");
    }
}
