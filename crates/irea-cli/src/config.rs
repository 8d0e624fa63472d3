// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use irea_app::{Coordinate, Region, TrendPolicy};
use irea_geo::{DEFAULT_MAPS_BASE_URL, DEFAULT_REGION_QUALIFIER, ProviderConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "irea";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "IREA_CONFIG_PATH";
const API_BASE_ENV: &str = "IREA_API_BASE";
const MAPS_KEY_ENV: &str = "IREA_MAPS_API_KEY";
const DEFAULT_API_TIMEOUT: &str = "60s";
const DEFAULT_HEALTH_TIMEOUT: &str = "6s";
const DEFAULT_MAPS_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_TREND_YEARS: u32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub maps: Maps,
    #[serde(default)]
    pub region: RegionBounds,
    #[serde(default)]
    pub trend: Trend,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            maps: Maps::default(),
            region: RegionBounds::default(),
            trend: Trend::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub health_timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
            health_timeout: Some(DEFAULT_HEALTH_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Maps {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub region_qualifier: Option<String>,
}

/// Overrides for the served rectangle. Unset values keep the Boston box.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionBounds {
    pub name: Option<String>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lng_min: Option<f64>,
    pub lng_max: Option<f64>,
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trend {
    pub default_rate: Option<f64>,
    pub years_back: Option<u32>,
    pub years_forward: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
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
                    "config file {} has no version. Add `version = 1` and keep values under [api], [maps], [region], [trend], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
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
        for (key, raw) in [
            ("api.timeout", &self.api.timeout),
            ("api.health_timeout", &self.api.health_timeout),
            ("maps.timeout", &self.maps.timeout),
        ] {
            if let Some(raw) = raw
                && parse_duration(raw)?.is_zero()
            {
                bail!("{key} in {} must be positive, got {raw}", path.display());
            }
        }

        let region = self.region();
        if !region.is_well_formed() {
            bail!(
                "[region] in {} is invalid: need a name, finite bounds with min < max, and a center inside them",
                path.display()
            );
        }

        if let Some(rate) = self.trend.default_rate
            && !rate.is_finite()
        {
            bail!(
                "trend.default_rate in {} must be a finite number",
                path.display()
            );
        }
        for (key, years) in [
            ("trend.years_back", self.trend.years_back),
            ("trend.years_forward", self.trend.years_forward),
        ] {
            if let Some(years) = years
                && years > MAX_TREND_YEARS
            {
                bail!(
                    "{key} in {} must be at most {MAX_TREND_YEARS}, got {years}",
                    path.display()
                );
            }
        }

        Ok(())
    }

    /// `IREA_API_BASE` wins over `[api].base_url`.
    pub fn api_base_url(&self) -> String {
        let configured = env_value(API_BASE_ENV)
            .or_else(|| self.api.base_url.clone())
            .unwrap_or_else(|| irea_api::DEFAULT_BASE_URL.to_owned());
        configured.trim().trim_end_matches('/').to_owned()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn api_health_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.api
                .health_timeout
                .as_deref()
                .unwrap_or(DEFAULT_HEALTH_TIMEOUT),
        )
    }

    /// `IREA_MAPS_API_KEY` wins over `[maps].api_key`.
    pub fn maps_api_key(&self) -> Option<String> {
        env_value(MAPS_KEY_ENV).or_else(|| {
            self.maps
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned)
        })
    }

    pub fn maps_base_url(&self) -> &str {
        self.maps
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_MAPS_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn maps_timeout(&self) -> Result<Duration> {
        parse_duration(self.maps.timeout.as_deref().unwrap_or(DEFAULT_MAPS_TIMEOUT))
    }

    pub fn region(&self) -> Region {
        let defaults = Region::boston();
        let bounds = &self.region;
        Region {
            name: bounds.name.clone().unwrap_or(defaults.name),
            lat_min: bounds.lat_min.unwrap_or(defaults.lat_min),
            lat_max: bounds.lat_max.unwrap_or(defaults.lat_max),
            lng_min: bounds.lng_min.unwrap_or(defaults.lng_min),
            lng_max: bounds.lng_max.unwrap_or(defaults.lng_max),
            center: Coordinate::new(
                bounds.center_lat.unwrap_or(defaults.center.latitude),
                bounds.center_lng.unwrap_or(defaults.center.longitude),
            ),
        }
    }

    pub fn trend_policy(&self) -> TrendPolicy {
        let defaults = TrendPolicy::default();
        TrendPolicy {
            default_rate: self.trend.default_rate.unwrap_or(defaults.default_rate),
            years_back: self.trend.years_back.unwrap_or(defaults.years_back),
            years_forward: self.trend.years_forward.unwrap_or(defaults.years_forward),
            ..defaults
        }
    }

    pub fn provider_config(&self) -> Result<ProviderConfig> {
        Ok(ProviderConfig {
            base_url: self.maps_base_url().to_owned(),
            api_key: self.maps_api_key(),
            region: self.region(),
            region_qualifier: self
                .maps
                .region_qualifier
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION_QUALIFIER.to_owned()),
            timeout: self.maps_timeout()?,
        })
    }

    pub fn log_level(&self) -> &str {
        self.log
            .level
            .as_deref()
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("irea.log"))
    }

    pub fn example_config(path: &Path) -> String {
        let region = Region::boston();
        let trend = TrendPolicy::default();
        format!(
            "# irea config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\nhealth_timeout = \"{}\"\n\n[maps]\n# Required for address search, place names, and street view. {} also works.\n# api_key = \"your-key\"\nbase_url = \"{}\"\ntimeout = \"{}\"\nregion_qualifier = \"{}\"\n\n[region]\nname = \"{}\"\nlat_min = {}\nlat_max = {}\nlng_min = {}\nlng_max = {}\ncenter_lat = {}\ncenter_lng = {}\n\n[trend]\ndefault_rate = {}\nyears_back = {}\nyears_forward = {}\n\n[log]\nlevel = \"{}\"\n# path = \"/absolute/path/to/irea.log\"\n",
            path.display(),
            irea_api::DEFAULT_BASE_URL,
            DEFAULT_API_TIMEOUT,
            DEFAULT_HEALTH_TIMEOUT,
            MAPS_KEY_ENV,
            DEFAULT_MAPS_BASE_URL,
            DEFAULT_MAPS_TIMEOUT,
            DEFAULT_REGION_QUALIFIER,
            region.name,
            region.lat_min,
            region.lat_max,
            region.lng_min,
            region.lng_max,
            region.center.latitude,
            region.center.longitude,
            trend.default_rate,
            trend.years_back,
            trend.years_forward,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
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
        let Some(secs) = mins.checked_mul(60) else {
            bail!("timeout duration {raw:?} is too large; use a smaller value such as 5s");
        };
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
