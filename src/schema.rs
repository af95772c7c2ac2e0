//! Shape validation for the static catalog files.
//!
//! Each file kind has a built-in JSON Schema, compiled once on first use.
//! Only the fields the loader depends on are required; everything else is
//! permissive so scrapers can add fields without breaking the site.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{CatalogError, Result};

static INDEX_SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["brands"],
        "properties": {
            "build_timestamp": { "type": ["string", "number", "null"] },
            "version": { "type": ["string", "number", "null"] },
            "total_products": { "type": "integer", "minimum": 0 },
            "total_verified": { "type": "integer", "minimum": 0 },
            "brands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name", "data_file"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "name": { "type": "string" },
                        "brand_color": { "type": ["string", "null"] },
                        "logo_url": { "type": ["string", "null"] },
                        "product_count": { "type": "integer", "minimum": 0 },
                        "verified_count": { "type": "integer", "minimum": 0 },
                        "data_file": { "type": "string", "minLength": 1 }
                    }
                }
            }
        }
    })
});

static BRAND_SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["brand_identity", "products"],
        "properties": {
            "brand_identity": {
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": { "type": "string", "minLength": 1 },
                    "name": { "type": "string" },
                    "logo_url": { "type": ["string", "null"] },
                    "website": { "type": ["string", "null"] },
                    "description": { "type": ["string", "null"] },
                    "categories": { "type": ["array", "null"], "items": { "type": "string" } }
                }
            },
            "products": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": ["string", "integer"] },
                        "name": { "type": "string" },
                        "category": { "type": ["string", "null"] },
                        "subcategory": { "type": ["string", "null"] },
                        "main_category": { "type": ["string", "null"] },
                        "verified": { "type": ["boolean", "null"] }
                    }
                }
            },
            "stats": { "type": ["object", "null"] }
        }
    })
});

static SEARCH_INDEX_SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["id", "label"],
            "properties": {
                "id": { "type": ["string", "integer"] },
                "label": { "type": "string" },
                "brand": { "type": "string" },
                "category": { "type": "string" },
                "keywords": { "type": "array", "items": { "type": "string" } }
            }
        }
    })
});

type Compiled = std::result::Result<JSONSchema, String>;

fn compile(schema: &'static Value) -> Compiled {
    JSONSchema::compile(schema).map_err(|e| e.to_string())
}

static INDEX_SCHEMA: Lazy<Compiled> = Lazy::new(|| compile(&INDEX_SCHEMA_JSON));
static BRAND_SCHEMA: Lazy<Compiled> = Lazy::new(|| compile(&BRAND_SCHEMA_JSON));
static SEARCH_INDEX_SCHEMA: Lazy<Compiled> = Lazy::new(|| compile(&SEARCH_INDEX_SCHEMA_JSON));

fn run(schema: &Compiled, what: &str, instance: &Value) -> Result<()> {
    let compiled = schema
        .as_ref()
        .map_err(|e| CatalogError::validation(format!("{} schema", what), e.clone()))?;
    if let Err(errors) = compiled.validate(instance) {
        let details = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    format!("- {}", err)
                } else {
                    format!("- {} (at {})", err, path)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        return Err(CatalogError::validation(what, details));
    }
    Ok(())
}

/// Validate a master index document (`index.json`).
pub fn validate_index(instance: &Value) -> Result<()> {
    run(&INDEX_SCHEMA, "master index", instance)
}

/// Validate a brand catalog document. `label` names the file in errors.
pub fn validate_brand(label: &str, instance: &Value) -> Result<()> {
    run(&BRAND_SCHEMA, &format!("brand file {}", label), instance)
}

pub fn validate_search_index(instance: &Value) -> Result<()> {
    run(&SEARCH_INDEX_SCHEMA, "search index", instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_index_passes() {
        let index = json!({
            "build_timestamp": "2025-01-10T08:00:00Z",
            "version": "3.1",
            "brands": [{ "id": "roland", "name": "Roland", "data_file": "roland.json" }]
        });
        assert!(validate_index(&index).is_ok());
    }

    #[test]
    fn test_index_missing_data_file_fails() {
        let index = json!({ "brands": [{ "id": "roland", "name": "Roland" }] });
        let err = validate_index(&index).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("data_file"), "{}", err);
    }

    #[test]
    fn test_brand_missing_identity_id_fails() {
        let brand = json!({
            "brand_identity": { "name": "Nord" },
            "products": []
        });
        let err = validate_brand("nord.json", &brand).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("nord.json"));
    }

    #[test]
    fn test_brand_with_extra_fields_passes() {
        let brand = json!({
            "brand_identity": { "id": "nord", "name": "Nord", "founded": 1983 },
            "products": [{ "id": 7, "name": "Stage 4", "scraped_at": "yesterday" }]
        });
        assert!(validate_brand("nord.json", &brand).is_ok());
    }

    #[test]
    fn test_search_index_requires_label() {
        let items = json!([{ "id": "a" }]);
        assert!(validate_search_index(&items).is_err());
        let items = json!([{ "id": "a", "label": "Juno-X" }]);
        assert!(validate_search_index(&items).is_ok());
    }
}
