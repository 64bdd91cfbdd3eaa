//! Policy resolution
//!
//! A project may carry a policy file in its root:
//! - `.seoscanrc.json` / `.seoscanrc.yaml` / `.seoscanrc.yml`
//! - `seoscan.json`
//!
//! The file has two optional sections, `seo` and `perf`, plus an optional `rules`
//! section used by the host to suppress codes. Every field is resolved on its own:
//! an absent or wrongly-typed value falls back to the built-in default without
//! affecting its neighbours, and a missing or unparsable file resolves to defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Policy file names, in lookup order
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    ".seoscanrc.json",
    ".seoscanrc.yaml",
    ".seoscanrc.yml",
    "seoscan.json",
];

pub const DEFAULT_TITLE_MIN: usize = 30;
pub const DEFAULT_TITLE_MAX: usize = 60;
pub const DEFAULT_META_DESCRIPTION_MIN: usize = 70;
pub const DEFAULT_META_DESCRIPTION_MAX: usize = 160;
pub const DEFAULT_MAX_THIRD_PARTY_SCRIPTS: usize = 5;
pub const DEFAULT_LCP_IMAGE_KB: usize = 200;

/// Imports and idioms that mean the document head is managed by a component library
pub const DEFAULT_HEAD_MANAGED_MARKERS: [&str; 9] = [
    "next/head",
    "react-helmet",
    "react-helmet-async",
    "@vueuse/head",
    "@unhead/vue",
    "useHead(",
    "<svelte:head",
    "export const metadata",
    "generateMetadata",
];

/// Error reading a policy file
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown policy file format: {0}")]
    UnknownFormat(String),
}

/// Fully resolved thresholds consumed by every rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub title_min: usize,
    pub title_max: usize,
    pub meta_description_min: usize,
    pub meta_description_max: usize,
    pub require_canonical: bool,
    /// Page types that should carry JSON-LD (e.g. `Product`, `Article`)
    pub require_json_ld_for: BTreeSet<String>,
    pub max_third_party_scripts_per_page: usize,
    #[serde(rename = "lcpImageKB")]
    pub lcp_image_kb: usize,
    pub require_font_display_swap: bool,
    /// Substrings marking a component-managed head (title injected at runtime)
    pub head_managed_markers: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            title_min: DEFAULT_TITLE_MIN,
            title_max: DEFAULT_TITLE_MAX,
            meta_description_min: DEFAULT_META_DESCRIPTION_MIN,
            meta_description_max: DEFAULT_META_DESCRIPTION_MAX,
            require_canonical: true,
            require_json_ld_for: ["Product", "Article"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_third_party_scripts_per_page: DEFAULT_MAX_THIRD_PARTY_SCRIPTS,
            lcp_image_kb: DEFAULT_LCP_IMAGE_KB,
            require_font_display_swap: true,
            head_managed_markers: DEFAULT_HEAD_MANAGED_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Policy {
    /// Whether JSON-LD is required for the given page type
    pub fn requires_json_ld(&self, page_type: &str) -> bool {
        self.require_json_ld_for.contains(page_type)
    }
}

/// Overlay a raw project configuration onto the defaults
pub fn resolve(raw: Option<&Value>) -> Policy {
    let mut policy = Policy::default();
    let Some(raw) = raw else {
        return policy;
    };

    let seo = raw.get("seo");
    let perf = raw.get("perf");

    overlay_count(seo, "titleMin", &mut policy.title_min);
    overlay_count(seo, "titleMax", &mut policy.title_max);
    overlay_count(seo, "metaDescriptionMin", &mut policy.meta_description_min);
    overlay_count(seo, "metaDescriptionMax", &mut policy.meta_description_max);
    overlay_bool(seo, "requireCanonical", &mut policy.require_canonical);
    if let Some(types) = string_list(seo, "requireJsonLdFor") {
        policy.require_json_ld_for = types.into_iter().collect();
    }
    if let Some(markers) = string_list(seo, "headManagedMarkers") {
        policy.head_managed_markers = markers;
    }

    overlay_count(
        perf,
        "maxThirdPartyScriptsPerPage",
        &mut policy.max_third_party_scripts_per_page,
    );
    overlay_count(perf, "lcpImageKB", &mut policy.lcp_image_kb);
    overlay_bool(
        perf,
        "requireFontDisplaySwap",
        &mut policy.require_font_display_swap,
    );

    policy
}

fn overlay_count(section: Option<&Value>, key: &str, slot: &mut usize) {
    if let Some(value) = section.and_then(|s| s.get(key)) {
        match value.as_u64().and_then(|n| usize::try_from(n).ok()) {
            Some(n) => *slot = n,
            None => log::debug!("policy field {} is not a count, using default", key),
        }
    }
}

fn overlay_bool(section: Option<&Value>, key: &str, slot: &mut bool) {
    if let Some(value) = section.and_then(|s| s.get(key)) {
        match value.as_bool() {
            Some(b) => *slot = b,
            None => log::debug!("policy field {} is not a boolean, using default", key),
        }
    }
}

/// A list of strings; any non-string entry rejects the whole field
fn string_list(section: Option<&Value>, key: &str) -> Option<Vec<String>> {
    let items = section?.get(key)?.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Policy plus host-side settings read from the same project file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    pub policy: Policy,
    /// Rule codes suppressed by the project
    pub disabled_rules: Vec<String>,
    /// File the configuration came from, if any
    pub source: Option<PathBuf>,
}

impl ProjectConfig {
    /// Resolve from an already-parsed document
    pub fn from_value(raw: &Value) -> Self {
        let disabled_rules = string_list(raw.get("rules"), "disabled").unwrap_or_default();
        Self {
            policy: resolve(Some(raw)),
            disabled_rules,
            source: None,
        }
    }

    /// Load a policy file, reporting read and parse failures
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let raw = read_value(path)?;
        let mut config = Self::from_value(&raw);
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Find the policy file in `root` and load it; any failure resolves to defaults
    pub fn discover(root: &Path) -> Self {
        let Some(path) = find_config_file(root) else {
            log::debug!("no policy file in {}, using defaults", root.display());
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                log::debug!("loaded policy from {}", path.display());
                config
            }
            Err(e) => {
                log::debug!(
                    "ignoring unreadable policy file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Whether a rule code is suppressed
    pub fn is_rule_disabled(&self, code: &str) -> bool {
        self.disabled_rules.iter().any(|c| c.eq_ignore_ascii_case(code))
    }
}

/// First existing policy file in `root`
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

fn read_value(path: &Path) -> Result<Value, PolicyError> {
    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "json" => Ok(serde_json::from_str(&content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        _ => Err(PolicyError::UnknownFormat(ext.to_string())),
    }
}
