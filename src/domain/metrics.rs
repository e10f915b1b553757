use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// The normalized performance indicators the engine can produce
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
pub enum NormalizedMetric {
    #[strum(serialize = "normalized_permeate_flow")]
    #[serde(rename = "normalized_permeate_flow")]
    PermeateFlow,
    #[strum(serialize = "normalized_differential_pressure")]
    #[serde(rename = "normalized_differential_pressure")]
    DifferentialPressure,
    #[strum(serialize = "normalized_permeate_TDS")]
    #[serde(rename = "normalized_permeate_TDS")]
    PermeateTds,
    #[strum(serialize = "net_driving_pressure")]
    #[serde(rename = "net_driving_pressure")]
    NetDrivingPressure,
    #[strum(serialize = "normalized_flux")]
    #[serde(rename = "normalized_flux")]
    Flux,
    #[strum(serialize = "normalized_salt_passage")]
    #[serde(rename = "normalized_salt_passage")]
    SaltPassage,
    #[strum(serialize = "normalized_specific_flux")]
    #[serde(rename = "normalized_specific_flux")]
    SpecificFlux,
}

impl NormalizedMetric {
    /// Column name of the metric in result tables
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Human readable label for dashboards
    pub fn label(self) -> &'static str {
        match self {
            NormalizedMetric::PermeateFlow => "Normalized Permeate Flow",
            NormalizedMetric::DifferentialPressure => "Normalized Differential Pressure",
            NormalizedMetric::PermeateTds => "Normalized Permeate TDS",
            NormalizedMetric::NetDrivingPressure => "Net Driving Pressure",
            NormalizedMetric::Flux => "Normalized Flux",
            NormalizedMetric::SaltPassage => "Normalized Salt Passage",
            NormalizedMetric::SpecificFlux => "Normalized Specific Flux",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            NormalizedMetric::PermeateFlow => "gpm",
            NormalizedMetric::DifferentialPressure => "psid",
            NormalizedMetric::PermeateTds => "mg/L",
            NormalizedMetric::NetDrivingPressure => "psig",
            NormalizedMetric::Flux => "gfd",
            NormalizedMetric::SaltPassage => "%",
            NormalizedMetric::SpecificFlux => "gfd/psig",
        }
    }
}
