//! # Halilit catalog
//!
//! Loads the Halilit Support Center's static brand catalog (a master index
//! plus one JSON file per brand), normalizes every product into one shape,
//! maps brand-specific categories onto a fixed universal taxonomy, and
//! provides fuzzy instant search over a prebuilt search index.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ DataSource  │──▶│   Loader    │──▶│ Consolidator │
//! │ HTTP / FS   │   │ validate +  │   │ galaxies /   │
//! └──────┬──────┘   │ normalize   │   │ spectra      │
//!        │          └──────┬──────┘   └──────┬───────┘
//!        ▼                 ▼                 ▼
//!  ┌──────────┐      ┌──────────┐      ┌──────────┐
//!  │  Search  │      │   CLI    │      │   HTTP   │
//!  │ (nucleo) │      │(halilit) │      │  (axum)  │
//!  └──────────┘      └──────────┘      └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Catalog error taxonomy |
//! | [`models`] | Raw and normalized catalog types |
//! | [`schema`] | JSON Schema validation of catalog files |
//! | [`source`] | HTTP, filesystem and in-memory data sources |
//! | [`normalize`] | Raw product → normalized product |
//! | [`loader`] | Cached index / brand / aggregate loading |
//! | [`taxonomy`] | The fixed galaxy / spectrum set |
//! | [`consolidator`] | Raw category → universal category |
//! | [`search`] | Fuzzy instant search |
//! | [`views`] | Category- and brand-scoped views |
//! | [`subjective`] | Local rating, tags and notes |
//! | [`watcher`] | Live reload of a local data directory |
//! | [`server`] | Read-only HTTP API |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod search;
pub mod server;
pub mod source;
pub mod subjective;
pub mod taxonomy;
pub mod views;
pub mod watcher;
