use std::fs;
use std::path::Path;

use super::constants;
use crate::renderer::ResizeFilter;

/// Runtime settings read from `terim.config` (`key = value` lines).
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub fallback_fps: u32,
    pub resize_filter: ResizeFilter,
    pub max_colors: Option<u16>,
    pub streaming: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_fps: constants::DEFAULT_FALLBACK_FPS,
            resize_filter: ResizeFilter::default(),
            max_colors: None,
            streaming: false,
            debug: false,
        }
    }
}

impl Config {
    /// Load the config file from the working directory, falling back to defaults
    /// when it is missing. `TERIM_DEBUG` forces debug logging on.
    pub fn load() -> Self {
        let mut config = Self::load_from(Path::new(constants::TERIM_CONFIG_FILE));
        if std::env::var_os(constants::DEBUG_ENV_VAR).is_some() {
            config.debug = true;
        }
        config
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse leniently: unknown keys and bad values are skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                crate::utils::logger::debug(&format!("config: ignoring line '{}'", trimmed));
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            let applied = match key {
                "fallback-fps" => value
                    .parse::<u32>()
                    .ok()
                    .filter(|fps| *fps > 0)
                    .map(|fps| config.fallback_fps = fps),
                "resize-filter" => value
                    .parse::<ResizeFilter>()
                    .ok()
                    .map(|filter| config.resize_filter = filter),
                "max-colors" => value
                    .parse::<u16>()
                    .ok()
                    .map(|colors| config.max_colors = Some(colors)),
                "streaming" => parse_bool(value).map(|flag| config.streaming = flag),
                "debug" => parse_bool(value).map(|flag| config.debug = flag),
                _ => None,
            };

            if applied.is_none() {
                crate::utils::logger::debug(&format!(
                    "config: ignoring '{}' = '{}'",
                    key, value
                ));
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_keys() {
        let config = Config::parse(
            "# terim settings\n\
             fallback-fps = 24\n\
             resize-filter = lanczos3\n\
             max-colors = 16\n\
             streaming = yes\n\
             debug = true\n",
        );
        assert_eq!(config.fallback_fps, 24);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.max_colors, Some(16));
        assert!(config.streaming);
        assert!(config.debug);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = Config::parse("fallback-fps = 0\nresize-filter = sinc\nmystery = 4\nnot a pair\n");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.config"));
        assert_eq!(config, Config::default());
    }
}
