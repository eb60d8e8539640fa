//! Application Configuration
//! Values come from environment variables, falling back to built-in defaults.

use encoding_rs::Encoding;
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "해양경찰청_해상조난사고 상세데이터 현황_20201231.csv";
pub const DEFAULT_ENCODING: &str = "windows-949";
pub const DEFAULT_REGION: &str = "평택";
pub const DEFAULT_MAP_ZOOM: u8 = 8;
pub const DEFAULT_MAP_STYLE: &str = "dark-v11";

/// Environment variable holding the map provider access token.
pub const MAP_TOKEN_VAR: &str = "MARINE";

/// Runtime configuration for the dashboard.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub encoding: &'static Encoding,
    pub initial_region: String,
    pub map_token: Option<String>,
    pub map_zoom: u8,
    pub map_style: String,
    /// TTF/OTF with Hangul glyphs; egui's bundled fonts have none.
    pub font_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            encoding: encoding_rs::EUC_KR,
            initial_region: DEFAULT_REGION.to_string(),
            map_token: None,
            map_zoom: DEFAULT_MAP_ZOOM,
            map_style: DEFAULT_MAP_STYLE.to_string(),
            font_path: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let encoding = match non_empty("MARINE_ENCODING") {
            Some(label) => Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
                log::warn!("Unknown encoding label `{label}`, using {DEFAULT_ENCODING}");
                defaults.encoding
            }),
            None => defaults.encoding,
        };

        Self {
            data_path: non_empty("MARINE_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            encoding,
            initial_region: non_empty("MARINE_REGION").unwrap_or(defaults.initial_region),
            map_token: non_empty(MAP_TOKEN_VAR),
            map_zoom: non_empty("MARINE_MAP_ZOOM")
                .and_then(|v| v.trim().parse().ok())
                .map(|zoom: u8| zoom.min(22))
                .unwrap_or(defaults.map_zoom),
            map_style: non_empty("MARINE_MAP_STYLE").unwrap_or(defaults.map_style),
            font_path: non_empty("MARINE_FONT").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]);
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(cfg.encoding, encoding_rs::EUC_KR);
        assert_eq!(cfg.initial_region, "평택");
        assert_eq!(cfg.map_token, None);
        assert_eq!(cfg.map_zoom, 8);
    }

    #[test]
    fn overrides_from_environment() {
        let cfg = config(&[
            ("MARINE", "pk.test"),
            ("MARINE_DATA", "/data/incidents.csv"),
            ("MARINE_ENCODING", "utf-8"),
            ("MARINE_REGION", "인천"),
            ("MARINE_MAP_ZOOM", "30"),
        ]);
        assert_eq!(cfg.map_token.as_deref(), Some("pk.test"));
        assert_eq!(cfg.data_path, PathBuf::from("/data/incidents.csv"));
        assert_eq!(cfg.encoding, encoding_rs::UTF_8);
        assert_eq!(cfg.initial_region, "인천");
        assert_eq!(cfg.map_zoom, 22);
    }

    #[test]
    fn blank_token_and_bad_values_fall_back() {
        let cfg = config(&[
            ("MARINE", "  "),
            ("MARINE_ENCODING", "klingon"),
            ("MARINE_MAP_ZOOM", "deep"),
        ]);
        assert_eq!(cfg.map_token, None);
        assert_eq!(cfg.encoding, encoding_rs::EUC_KR);
        assert_eq!(cfg.map_zoom, DEFAULT_MAP_ZOOM);
    }
}
