// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::FilterConfig;

pub const DEFAULT_WATCH_CONFIG_PATH: &str = "config/watch.toml";
pub const ENV_WATCH_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";

/// Static watcher configuration. Fixed at process start, never reloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub models: Vec<String>,
    /// Inclusive ceiling, in the catalog's currency.
    pub max_price: f64,
    pub market: String,
    pub condition: String,
    pub check_interval_secs: u64,
    pub jitter_secs: u64,
    pub heartbeat_secs: u64,
    pub digest_secs: u64,
    pub escalation_window_secs: u64,
    pub page_size: u32,
    pub fetch_timeout_secs: u64,
    pub send_timeout_secs: u64,
    /// Keep full records next to identities so `/cached` can dump them.
    pub retain_records: bool,
    pub catalog_url: String,
    pub listing_url_base: String,
    pub telegram_api_base: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            models: vec!["Model 3".into(), "Model Y".into(), "Model X".into()],
            max_price: 31_000.0,
            market: "US".into(),
            condition: "used".into(),
            check_interval_secs: 120,
            jitter_secs: 20,
            heartbeat_secs: 3_600,
            digest_secs: 3 * 3_600,
            escalation_window_secs: 3_600,
            page_size: 50,
            fetch_timeout_secs: 20,
            send_timeout_secs: 10,
            retain_records: true,
            catalog_url: "https://www.tesla.com/inventory/api/v4/inventory-results".into(),
            listing_url_base: "https://www.tesla.com/m3/order/".into(),
            telegram_api_base: "https://api.telegram.org".into(),
        }
    }
}

impl WatchConfig {
    /// Load from an explicit TOML file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading watch config from {}", path.display()))?;
        let cfg: WatchConfig = toml::from_str(&content)
            .with_context(|| format!("parsing watch config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $WATCH_CONFIG_PATH
    /// 2) config/watch.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_WATCH_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("WATCH_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_WATCH_CONFIG_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.models.iter().all(|m| m.trim().is_empty()) {
            bail!("at least one model must be configured");
        }
        if !self.max_price.is_finite() || self.max_price < 0.0 {
            bail!("max_price must be a non-negative number");
        }
        if self.check_interval_secs == 0 {
            bail!("check_interval_secs must be > 0");
        }
        if self.heartbeat_secs == 0 || self.digest_secs == 0 {
            bail!("heartbeat_secs and digest_secs must be > 0");
        }
        if self.page_size == 0 {
            bail!("page_size must be > 0");
        }
        if self.fetch_timeout_secs == 0 || self.send_timeout_secs == 0 {
            bail!("timeouts must be > 0");
        }
        Ok(())
    }

    pub fn filter(&self) -> FilterConfig {
        FilterConfig::new(self.models.clone(), self.max_price, self.market.clone())
    }

    pub fn escalation_window(&self) -> Duration {
        Duration::from_secs(self.escalation_window_secs)
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn digest_period(&self) -> Duration {
        Duration::from_secs(self.digest_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: WatchConfig = toml::from_str(
            r#"
models = ["Model Y"]
max_price = 45000
"#,
        )
        .unwrap();
        assert_eq!(cfg.models, vec!["Model Y".to_string()]);
        assert_eq!(cfg.max_price, 45_000.0);
        assert_eq!(cfg.check_interval_secs, 120);
        assert_eq!(cfg.market, "US");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval_and_empty_models() {
        let cfg = WatchConfig {
            check_interval_secs: 0,
            ..WatchConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = WatchConfig {
            models: vec![" ".into()],
            ..WatchConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = WatchConfig {
            max_price: -1.0,
            ..WatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ does not leak in.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_WATCH_CONFIG_PATH);
        assert_eq!(WatchConfig::load_default().unwrap(), WatchConfig::default());

        let p = tmp.path().join("watch.toml");
        fs::write(&p, "market = \"CA\"\n").unwrap();
        env::set_var(ENV_WATCH_CONFIG_PATH, p.display().to_string());
        assert_eq!(WatchConfig::load_default().unwrap().market, "CA");

        env::set_var(ENV_WATCH_CONFIG_PATH, tmp.path().join("nope.toml"));
        assert!(WatchConfig::load_default().is_err());
        env::remove_var(ENV_WATCH_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
