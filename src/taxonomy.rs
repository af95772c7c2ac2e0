//! The fixed universal taxonomy: galaxies and their spectra.
//!
//! The set and order of galaxies never changes at runtime. Selecting a
//! brand changes which products populate each galaxy, never which galaxies
//! exist, so navigation stays put while users switch brands.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SpectrumDef {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GalaxyDef {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub spectra: &'static [SpectrumDef],
}

pub const DEFAULT_GALAXY: &str = "accessories";
pub const DEFAULT_SPECTRUM: &str = "accessories-general";

/// Pseudo-category meaning "no category filter".
pub const ALL: &str = "all";

macro_rules! spectrum {
    ($id:literal, $label:literal, $color:literal, $icon:literal) => {
        SpectrumDef {
            id: $id,
            label: $label,
            color: $color,
            icon: $icon,
            image: concat!("/assets/spectra/", $id, ".webp"),
        }
    };
}

pub static GALAXIES: &[GalaxyDef] = &[
    GalaxyDef {
        id: "keys",
        label: "Keys & Production",
        color: "#f59e0b",
        icon: "piano",
        spectra: &[
            spectrum!("synthesizers", "Synthesizers", "#f59e0b", "waveform"),
            spectrum!("pianos", "Digital Pianos", "#d97706", "piano"),
            spectrum!("organs", "Organs", "#b45309", "organ"),
            spectrum!("workstations", "Workstations & Arrangers", "#fbbf24", "keyboard"),
            spectrum!("controllers", "MIDI Controllers", "#fcd34d", "sliders"),
            spectrum!("grooveboxes", "Grooveboxes & Samplers", "#92400e", "grid"),
        ],
    },
    GalaxyDef {
        id: "drums",
        label: "Drums & Percussion",
        color: "#ef4444",
        icon: "drum",
        spectra: &[
            spectrum!("electronic-drums", "Electronic Drums", "#ef4444", "drum"),
            spectrum!("acoustic-drums", "Acoustic Drums", "#dc2626", "snare"),
            spectrum!("percussion", "Percussion", "#f87171", "shaker"),
            spectrum!("drum-machines", "Drum Machines", "#b91c1c", "grid"),
        ],
    },
    GalaxyDef {
        id: "guitars",
        label: "Guitars & Bass",
        color: "#8b5cf6",
        icon: "guitar",
        spectra: &[
            spectrum!("electric-guitars", "Electric Guitars", "#8b5cf6", "guitar"),
            spectrum!("acoustic-guitars", "Acoustic Guitars", "#7c3aed", "guitar-acoustic"),
            spectrum!("bass", "Bass Guitars", "#6d28d9", "bass"),
            spectrum!("amplifiers", "Amplifiers", "#a78bfa", "amp"),
            spectrum!("effects", "Pedals & Effects", "#c4b5fd", "pedal"),
        ],
    },
    GalaxyDef {
        id: "studio",
        label: "Studio & Recording",
        color: "#3b82f6",
        icon: "mic",
        spectra: &[
            spectrum!("interfaces", "Audio Interfaces", "#3b82f6", "interface"),
            spectrum!("microphones", "Microphones", "#2563eb", "mic"),
            spectrum!("monitors", "Studio Monitors", "#1d4ed8", "speaker"),
            spectrum!("headphones", "Headphones", "#60a5fa", "headphones"),
        ],
    },
    GalaxyDef {
        id: "live",
        label: "Live Sound",
        color: "#10b981",
        icon: "speaker",
        spectra: &[
            spectrum!("pa-systems", "PA Systems", "#10b981", "speaker"),
            spectrum!("mixers", "Mixers", "#059669", "mixer"),
            spectrum!("wireless", "Wireless Systems", "#34d399", "antenna"),
        ],
    },
    GalaxyDef {
        id: "dj",
        label: "DJ & Performance",
        color: "#ec4899",
        icon: "disc",
        spectra: &[
            spectrum!("dj-controllers", "DJ Controllers", "#ec4899", "controller"),
            spectrum!("turntables", "Turntables & Players", "#db2777", "disc"),
            spectrum!("dj-mixers", "DJ Mixers", "#f472b6", "mixer"),
        ],
    },
    GalaxyDef {
        id: "software",
        label: "Software & Cloud",
        color: "#06b6d4",
        icon: "cloud",
        spectra: &[
            spectrum!("plugins", "Plugins & Instruments", "#06b6d4", "plug"),
            spectrum!("daw", "DAW & Recording Software", "#0891b2", "timeline"),
        ],
    },
    GalaxyDef {
        id: "accessories",
        label: "Accessories",
        color: "#6b7280",
        icon: "box",
        spectra: &[
            spectrum!("cables", "Cables", "#6b7280", "cable"),
            spectrum!("stands", "Stands", "#4b5563", "stand"),
            spectrum!("cases", "Cases & Bags", "#9ca3af", "case"),
            spectrum!("accessories-general", "General Accessories", "#d1d5db", "box"),
        ],
    },
];

pub fn galaxies() -> &'static [GalaxyDef] {
    GALAXIES
}

pub fn galaxy(id: &str) -> Option<&'static GalaxyDef> {
    GALAXIES.iter().find(|g| g.id.eq_ignore_ascii_case(id))
}

/// Look up a spectrum by id, together with the galaxy that owns it.
pub fn spectrum(id: &str) -> Option<(&'static GalaxyDef, &'static SpectrumDef)> {
    GALAXIES.iter().find_map(|g| {
        g.spectra
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(id))
            .map(|s| (g, s))
    })
}
