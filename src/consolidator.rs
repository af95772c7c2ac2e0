//! Brand-native category strings → universal galaxy / spectrum ids.
//!
//! Matching is lower-cased substring containment against an ordered rule
//! table; the first rule that matches wins. Brand overrides are consulted
//! before the global table. Fields are tried in priority order
//! subcategory → category → main_category. Everything here is pure: no
//! I/O and no state, so identical input always yields identical output.
//!
//! Ambiguous strings ("Bass Amp", "Drum Machine") resolve by table order.
//! The order below is the contract; reorder only together with the data.

use serde::Serialize;

use crate::models::Product;
use crate::taxonomy::{self, DEFAULT_GALAXY, DEFAULT_SPECTRUM};

/// Brand-specific rules: `(brand id, substring, spectrum id)`.
static BRAND_RULES: &[(&str, &str, &str)] = &[
    ("nord", "stage", "pianos"),
    ("nord", "electro", "pianos"),
    ("nord", "lead", "synthesizers"),
    ("nord", "wave", "synthesizers"),
    ("nord", "c2d", "organs"),
    ("boss", "katana", "amplifiers"),
    ("boss", "compact", "effects"),
    ("boss", "looper", "effects"),
    ("roland", "aira", "grooveboxes"),
    ("roland", "zenbeats", "daw"),
    ("akai", "mpc", "grooveboxes"),
    ("akai", "mpk", "controllers"),
    ("pioneer-dj", "cdj", "turntables"),
    ("pioneer-dj", "djm", "dj-mixers"),
    ("pioneer-dj", "ddj", "dj-controllers"),
];

/// Global rules: `(substring, spectrum id)`, most specific first.
static RULES: &[(&str, &str)] = &[
    // DJ before generic mixers/controllers
    ("dj controller", "dj-controllers"),
    ("dj mixer", "dj-mixers"),
    ("turntable", "turntables"),
    ("media player", "turntables"),
    // controllers before "keyboard"/"pad"
    ("midi controller", "controllers"),
    ("keyboard controller", "controllers"),
    ("pad controller", "controllers"),
    ("controller", "controllers"),
    // drums
    ("drum machine", "drum-machines"),
    ("rhythm composer", "drum-machines"),
    ("v-drums", "electronic-drums"),
    ("electronic drum", "electronic-drums"),
    ("e-drum", "electronic-drums"),
    ("drum module", "electronic-drums"),
    ("bass drum", "acoustic-drums"),
    ("acoustic drum", "acoustic-drums"),
    ("snare", "acoustic-drums"),
    ("cymbal", "acoustic-drums"),
    ("drum", "electronic-drums"),
    ("percussion", "percussion"),
    ("cajon", "percussion"),
    // keys
    ("synth", "synthesizers"),
    ("stage piano", "pianos"),
    ("digital piano", "pianos"),
    ("piano", "pianos"),
    ("organ", "organs"),
    ("workstation", "workstations"),
    ("arranger", "workstations"),
    ("groovebox", "grooveboxes"),
    ("sampler", "grooveboxes"),
    ("sequencer", "grooveboxes"),
    // accessories that would otherwise hit "pedal"
    ("sustain pedal", "accessories-general"),
    ("expression pedal", "accessories-general"),
    ("footswitch", "accessories-general"),
    // guitars
    ("bass amp", "amplifiers"),
    ("guitar amp", "amplifiers"),
    ("amplifier", "amplifiers"),
    ("amp head", "amplifiers"),
    ("combo", "amplifiers"),
    ("pedal", "effects"),
    ("effect", "effects"),
    ("multi-fx", "effects"),
    ("stompbox", "effects"),
    ("bass", "bass"),
    ("acoustic guitar", "acoustic-guitars"),
    ("classical guitar", "acoustic-guitars"),
    ("guitar", "electric-guitars"),
    // studio
    ("audio interface", "interfaces"),
    ("interface", "interfaces"),
    ("microphone", "microphones"),
    // in-ear monitors are personal listening, not studio monitors
    ("in-ear", "headphones"),
    ("headphone", "headphones"),
    ("studio monitor", "monitors"),
    ("monitor", "monitors"),
    // live
    ("pa system", "pa-systems"),
    ("loudspeaker", "pa-systems"),
    ("speaker", "pa-systems"),
    ("mixing console", "mixers"),
    ("mixer", "mixers"),
    ("wireless", "wireless"),
    // software
    ("daw", "daw"),
    ("plugin", "plugins"),
    ("plug-in", "plugins"),
    ("software", "plugins"),
    // accessories
    ("cable", "cables"),
    ("stand", "stands"),
    ("gig bag", "cases"),
    ("case", "cases"),
    ("bag", "cases"),
    ("accessor", "accessories-general"),
];

/// Result of consolidating one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Consolidation {
    pub galaxy: &'static str,
    pub spectrum: &'static str,
}

impl Consolidation {
    pub const DEFAULT: Consolidation = Consolidation {
        galaxy: DEFAULT_GALAXY,
        spectrum: DEFAULT_SPECTRUM,
    };

    /// True when `category` names this galaxy or this spectrum.
    pub fn matches(&self, category: &str) -> bool {
        self.galaxy.eq_ignore_ascii_case(category) || self.spectrum.eq_ignore_ascii_case(category)
    }
}

fn resolve(spectrum_id: &'static str) -> Option<Consolidation> {
    taxonomy::spectrum(spectrum_id).map(|(g, s)| Consolidation {
        galaxy: g.id,
        spectrum: s.id,
    })
}

/// Match a single raw category string; `None` when no rule applies.
pub fn classify(brand: &str, raw: &str) -> Option<Consolidation> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let brand = brand.trim().to_lowercase();

    BRAND_RULES
        .iter()
        .filter(|(b, _, _)| *b == brand)
        .find(|(_, needle, _)| text.contains(needle))
        .map(|(_, _, spectrum)| *spectrum)
        .or_else(|| {
            RULES
                .iter()
                .find(|(needle, _)| text.contains(needle))
                .map(|(_, spectrum)| *spectrum)
        })
        .and_then(resolve)
}

/// Galaxy id for a raw category string, falling back to `"accessories"`.
pub fn consolidate_category(brand: &str, raw: &str) -> &'static str {
    classify(brand, raw).unwrap_or(Consolidation::DEFAULT).galaxy
}

/// Consolidate a product, trying subcategory, category, then main_category.
pub fn consolidate_product(product: &Product) -> Consolidation {
    consolidate_fields(
        &product.brand,
        [
            product.subcategory.as_deref(),
            Some(product.category.as_str()),
            product.main_category.as_deref(),
        ],
    )
}

pub fn consolidate_fields(brand: &str, fields: [Option<&str>; 3]) -> Consolidation {
    fields
        .into_iter()
        .flatten()
        .find_map(|raw| classify(brand, raw))
        .unwrap_or(Consolidation::DEFAULT)
}
