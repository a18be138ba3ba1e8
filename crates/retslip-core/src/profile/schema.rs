use serde::{Deserialize, Serialize};

/// Data-specific constants driving the detectors and the recoverer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Constant leading digits of every slip number (e.g. "7290000").
    pub slip_prefix: String,
    /// Digits following the prefix; prefix + suffix must make 12.
    pub slip_suffix_digits: usize,
    /// Recognized state/region codes for field 0.
    pub state_codes: Vec<String>,
    /// State code written by the recoverer, which cannot see field 0.
    pub default_state_code: String,
    /// Warehouse code used when a collapsed row carries none.
    pub fallback_warehouse_code: String,
    pub jobsite_lead_digit: String,
    pub jobsite_digits: usize,
    pub cost_center_prefix: String,
    /// Letters that may follow a coded tablet number, e.g. "MALT".
    pub tablet_suffixes: String,
    /// Customer names matched as substrings; first match wins.
    #[serde(default)]
    pub known_customers: Vec<String>,
    /// Substrings marking page headers, footers and header repeats.
    #[serde(default)]
    pub noise_markers: Vec<String>,
    /// A cell longer than this holding a slip id is a collapsed row.
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: usize,
    /// Same, for columns 1 and 2 which normally hold short ids.
    #[serde(default = "default_fused_cell_threshold")]
    pub fused_cell_threshold: usize,
    /// Characters at the end of a collapsed row scanned for trailing counts.
    #[serde(default = "default_tail_window")]
    pub tail_window: usize,
    /// Inclusive year range of the holiday calendar.
    pub holiday_years: [i32; 2],
}

fn default_collapse_threshold() -> usize {
    80
}

fn default_fused_cell_threshold() -> usize {
    30
}

fn default_tail_window() -> usize {
    80
}
