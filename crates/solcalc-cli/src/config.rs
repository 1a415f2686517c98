// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use solcalc_app::{Catalog, ImageCatalog, PriceList, QuoteGenerator};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "solcalc";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_KEY_ENV: &str = "SOLCALC_LLM_API_KEY";
const DEFAULT_LLM_TIMEOUT: &str = "30s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub catalog: CatalogDefaults,
    #[serde(default)]
    pub pricing: PriceList,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub llm: Llm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            catalog: CatalogDefaults::default(),
            pricing: PriceList::default(),
            export: Export::default(),
            llm: Llm::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDefaults {
    pub default_panel: Option<String>,
    pub default_city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Llm {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub extra_context: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Llm {
    fn default() -> Self {
        Self {
            enabled: Some(false),
            base_url: Some(DEFAULT_LLM_BASE_URL.to_owned()),
            model: Some(DEFAULT_LLM_MODEL.to_owned()),
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_owned()),
            extra_context: Some(String::new()),
            timeout: Some(DEFAULT_LLM_TIMEOUT.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SOLCALC_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SOLCALC_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [catalog], [pricing], [export], and [llm]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Regenerate it with `solcalc --print-example-config`",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let catalog = Catalog::builtin();
        if let Some(panel) = &self.catalog.default_panel
            && catalog.panel(panel).is_none()
        {
            bail!(
                "catalog.default_panel {:?} in {} is not a known panel -- run `solcalc --list-panels`",
                panel,
                path.display()
            );
        }
        if let Some(city) = &self.catalog.default_city
            && catalog.city(city).is_none()
        {
            bail!(
                "catalog.default_city {:?} in {} is not a known city -- run `solcalc --list-cities`",
                city,
                path.display()
            );
        }

        self.pricing
            .validate()
            .with_context(|| format!("invalid [pricing] in {}", path.display()))?;

        if let Some(dir) = &self.export.dir
            && dir.trim().is_empty()
        {
            bail!("export.dir in {} must not be empty", path.display());
        }

        if let Some(base_url) = &self.llm.base_url {
            solcalc_llm::normalize_base_url(base_url)
                .with_context(|| format!("invalid [llm] in {}", path.display()))?;
        }

        if let Some(timeout) = &self.llm.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "llm.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        Ok(())
    }

    pub fn default_panel(&self) -> Option<&str> {
        self.catalog.default_panel.as_deref()
    }

    pub fn default_city(&self) -> Option<&str> {
        self.catalog.default_city.as_deref()
    }

    pub fn quote_generator(&self) -> QuoteGenerator {
        QuoteGenerator::new(self.pricing.clone(), ImageCatalog::default())
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.export.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => solcalc_report::default_export_dir(),
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled.unwrap_or(false)
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_LLM_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn llm_model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }

    pub fn llm_api_key_env(&self) -> &str {
        self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Key read from the configured environment variable; unset or blank means none.
    pub fn llm_api_key(&self) -> Option<String> {
        env::var(self.llm_api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn llm_timeout(&self) -> Result<Duration> {
        parse_duration(self.llm.timeout.as_deref().unwrap_or(DEFAULT_LLM_TIMEOUT))
    }

    pub fn llm_extra_context(&self) -> &str {
        self.llm.extra_context.as_deref().unwrap_or("")
    }

    pub fn example_config(path: &Path) -> String {
        let prices = PriceList::default();
        let mut pricing = String::new();
        for (name, price) in prices.entries() {
            pricing.push_str(&format!("# {name} = {price}\n"));
        }
        format!(
            "# solcalc config\n# Place this file at: {}\n\nversion = 1\n\n[catalog]\n# default_panel = \"cs-550\"\n# default_city = \"Medellín\"\n\n[pricing]\n# Unit prices in COP. Uncomment to override.\n{pricing}\n[export]\n# Optional. Default is <documents>/solcalc\n# dir = \"/absolute/path/to/exports\"\n\n[llm]\nenabled = false\nbase_url = \"{}\"\nmodel = \"{}\"\napi_key_env = \"{}\"\nextra_context = \"\"\ntimeout = \"{}\"\n",
            path.display(),
            DEFAULT_LLM_BASE_URL,
            DEFAULT_LLM_MODEL,
            DEFAULT_API_KEY_ENV,
            DEFAULT_LLM_TIMEOUT,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert!(!config.llm_enabled());
        assert_eq!(config.llm_timeout()?, Duration::from_secs(30));
        assert_eq!(config.pricing.panel_unit, 350_000);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[llm]\nmodel=\"gpt-4o\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[catalog], [pricing], [export], and [llm]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 7\n")?;
        let error = Config::load(&path).expect_err("v7 config should fail");
        assert!(error.to_string().contains("unsupported config version 7"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses_with_pricing_overrides() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[catalog]\ndefault_panel = \"jinko-625\"\ndefault_city = \"Cali\"\n[pricing]\nlabor_base = 1000000\n[export]\ndir = \"/tmp/solcalc-out\"\n[llm]\nenabled = true\nmodel = \"gpt-4o\"\ntimeout = \"500ms\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.default_panel(), Some("jinko-625"));
        assert_eq!(config.default_city(), Some("Cali"));
        assert_eq!(config.pricing.labor_base, 1_000_000);
        assert_eq!(config.pricing.grounding, 180_000);
        assert_eq!(config.export_dir()?, PathBuf::from("/tmp/solcalc-out"));
        assert!(config.llm_enabled());
        assert_eq!(config.llm_model(), "gpt-4o");
        assert_eq!(config.llm_timeout()?, Duration::from_millis(500));
        assert_eq!(config.quote_generator().prices().labor_base, 1_000_000);
        Ok(())
    }

    #[test]
    fn unknown_catalog_defaults_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[catalog]\ndefault_panel = \"nope\"\n")?;
        let error = Config::load(&path).expect_err("unknown panel should fail");
        assert!(error.to_string().contains("--list-panels"));

        let (_temp, path) = write_config("version = 1\n[catalog]\ndefault_city = \"Lima\"\n")?;
        let error = Config::load(&path).expect_err("unknown city should fail");
        assert!(error.to_string().contains("--list-cities"));
        Ok(())
    }

    #[test]
    fn negative_prices_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[pricing]\nconduit = -5\n")?;
        let error = Config::load(&path).expect_err("negative price should fail");
        let message = format!("{error:#}");
        assert!(message.contains("[pricing]"));
        assert!(message.contains("conduit"));
        Ok(())
    }

    #[test]
    fn llm_base_url_must_be_http() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[llm]\nbase_url = \"file:///etc\"\n")?;
        assert!(Config::load(&path).is_err());

        let (_temp, path) =
            write_config("version = 1\n[llm]\nbase_url = \"http://localhost:8080/v1///\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.llm_base_url(), "http://localhost:8080/v1");
        Ok(())
    }

    #[test]
    fn llm_timeout_rejects_non_positive_values_in_config() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[llm]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn llm_timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
        Ok(())
    }

    #[test]
    fn api_key_is_read_from_named_env_var() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[llm]\napi_key_env = \"SOLCALC_TEST_KEY\"\n")?;
        let config = Config::load(&path)?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("SOLCALC_TEST_KEY", "sk-123");
        }
        let key = config.llm_api_key();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::set_var("SOLCALC_TEST_KEY", "  ");
        }
        let blank = config.llm_api_key();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("SOLCALC_TEST_KEY");
        }
        assert_eq!(key.as_deref(), Some("sk-123"));
        assert!(blank.is_none());
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("SOLCALC_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("SOLCALC_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[pricing]"));
        assert!(example.contains("# battery_block = 950000"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert!(!config.llm_enabled());
        Ok(())
    }
}
