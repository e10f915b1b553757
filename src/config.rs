use anyhow::Result;
use chrono::{DateTime, Utc};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{BaselineRecord, RawBaseline};
use crate::normalization::NormalizationRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub acquisition: AcquisitionConfig,
    pub request: NormalizationRequest,
    #[serde(default)]
    pub baseline: BaselineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    pub base_url: String,
    pub http_timeout_seconds: u64,
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

/// Where the baseline comes from: history around `instant`, or `values`
/// supplied directly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaselineConfig {
    pub instant: Option<DateTime<Utc>>,
    pub values: Option<RawBaseline>,
    /// Reject non-numeric baseline values instead of treating them as null
    #[serde(default)]
    pub strict: bool,
}

impl BaselineConfig {
    /// The supplied baseline table, when there is one
    pub fn record(&self) -> crate::Result<Option<BaselineRecord>> {
        self.values
            .as_ref()
            .map(|raw| BaselineRecord::from_raw(raw, self.instant, self.strict))
            .transpose()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("MEMBRANE__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.request.check()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterMode, NormalizedMetric, Tag};

    const TOML: &str = r#"
        [acquisition]
        base_url = "http://localhost:8086"
        http_timeout_seconds = 30

        [request]
        system_id = "WEST_MORGAN_1_RO1"
        start = "2022-09-01T00:00:00Z"
        end = "2022-09-02T00:00:00Z"
        metrics = ["normalized_permeate_flow", "normalized_salt_passage"]
        filter_mode = "null_columns"

        [request.filters.recovery]
        low = 70.0
        high = 90.0

        [baseline]
        instant = "2022-09-01T09:18:00Z"
    "#;

    #[test]
    fn test_loads_request_from_toml() {
        let cfg = Config::from_figment(Figment::new().merge(Toml::string(TOML))).unwrap();
        assert_eq!(cfg.acquisition.timeout(), Duration::from_secs(30));
        assert_eq!(
            cfg.request.metrics,
            vec![NormalizedMetric::PermeateFlow, NormalizedMetric::SaltPassage]
        );
        assert_eq!(cfg.request.filter_mode, FilterMode::NullColumns);
        assert_eq!(cfg.request.filters.recovery.low, 70.0);
        assert_eq!(cfg.request.filters.feed_flow.high, f64::INFINITY);
        assert_eq!(cfg.request.group_interval_seconds, 10);
        assert!(cfg.baseline.instant.is_some());
        assert!(cfg.baseline.record().unwrap().is_none());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let toml = TOML.replace("2022-09-02T00:00:00Z", "2022-08-31T00:00:00Z");
        assert!(Config::from_figment(Figment::new().merge(Toml::string(&toml))).is_err());
    }

    #[test]
    fn test_supplied_baseline_values() {
        let values: RawBaseline = Tag::required()
            .map(|tag| (tag.name().to_string(), serde_json::json!(1.5)))
            .collect();
        let baseline = BaselineConfig {
            instant: None,
            values: Some(values),
            strict: true,
        };
        let record = baseline.record().unwrap().unwrap();
        assert_eq!(record.value(Tag::Pt2), Some(1.5));
    }
}
