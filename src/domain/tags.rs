use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Logical tag name -> sensor id, as configured per system.
pub type TagMapping = BTreeMap<String, String>;

/// Raw sensor tags the engine reads.
///
/// Every variant belongs to the fixed required-tag set: a baseline must carry a
/// value (possibly null) for each of them, and the main fetch requests all of
/// them.
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
pub enum Tag {
    /// Analyzer input 1
    #[strum(serialize = "AIT1")]
    #[serde(rename = "AIT1")]
    Ait1,
    /// Feed conductivity (uS/cm)
    #[strum(serialize = "CIT1")]
    #[serde(rename = "CIT1")]
    Cit1,
    /// Reject conductivity (mS/cm)
    #[strum(serialize = "CIT2")]
    #[serde(rename = "CIT2")]
    Cit2,
    /// Permeate conductivity (uS/cm)
    #[strum(serialize = "CIT3")]
    #[serde(rename = "CIT3")]
    Cit3,
    /// Feed flow (gpm)
    #[strum(serialize = "FIT1")]
    #[serde(rename = "FIT1")]
    Fit1,
    /// Recirculation flow (gpm)
    #[strum(serialize = "FIT2")]
    #[serde(rename = "FIT2")]
    Fit2,
    /// Permeate flow (gpm)
    #[strum(serialize = "FIT3")]
    #[serde(rename = "FIT3")]
    Fit3,
    /// Volumetric recovery of the last closed-circuit cycle
    #[strum(serialize = "Last_CCD_VR")]
    #[serde(rename = "Last_CCD_VR")]
    LastCcdVr,
    /// Module differential pressure
    #[strum(serialize = "M_DP")]
    #[serde(rename = "M_DP")]
    ModuleDp,
    /// Feed pressure (psig)
    #[strum(serialize = "PT2")]
    #[serde(rename = "PT2")]
    Pt2,
    /// Reject pressure (psig)
    #[strum(serialize = "PT3")]
    #[serde(rename = "PT3")]
    Pt3,
    /// Permeate pressure (psig)
    #[strum(serialize = "PT7")]
    #[serde(rename = "PT7")]
    Pt7,
    /// Feed temperature (°F)
    #[strum(serialize = "TT1")]
    #[serde(rename = "TT1")]
    Tt1,
    /// Volumetric recovery setpoint
    #[strum(serialize = "Volumetric_Recovery")]
    #[serde(rename = "Volumetric_Recovery")]
    VolumetricRecovery,
}

impl Tag {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The fixed required-tag set, in declaration order.
    pub fn required() -> impl Iterator<Item = Tag> {
        Tag::iter()
    }
}

/// Column holding module recovery for quality filtering.
pub const RECOVERY_TAG: Tag = Tag::LastCcdVr;
/// Column holding feed flow for quality filtering.
pub const FEED_FLOW_TAG: Tag = Tag::Fit1;
/// Column holding reject conductivity for quality filtering.
pub const REJECT_CONDUCTIVITY_TAG: Tag = Tag::Cit2;

/// Setpoint for reject conductivity (not part of the required set).
pub const REJECT_CONDUCTIVITY_SETPOINT: &str = "Reject_Conductivity";
/// Feed flow setpoint during closed-circuit operation.
pub const FEED_FLOW_LOW_SETPOINT: &str = "Feed_flow_low";
/// Feed flow setpoint during plug-flow operation.
pub const FEED_FLOW_HIGH_SETPOINT: &str = "Feed_flow_high";

/// Factory tag mapping shipped with standard skids.
pub fn default_tag_mapping() -> TagMapping {
    [
        (Tag::Ait1.name(), "TAG084"),
        (Tag::Cit1.name(), "TAG087"),
        (Tag::Cit2.name(), "TAG088"),
        (Tag::Cit3.name(), "TAG089"),
        (Tag::Fit1.name(), "TAG071"),
        (Tag::Fit2.name(), "TAG072"),
        (Tag::Fit3.name(), "TAG073"),
        (Tag::LastCcdVr.name(), "TAG044"),
        (Tag::ModuleDp.name(), "TAG038"),
        (Tag::Pt2.name(), "TAG078"),
        (Tag::Pt3.name(), "TAG079"),
        (Tag::Pt7.name(), "TAG080"),
        (Tag::Tt1.name(), "TAG092"),
        (Tag::VolumetricRecovery.name(), "SP023"),
        (REJECT_CONDUCTIVITY_SETPOINT, "SP024"),
        (FEED_FLOW_LOW_SETPOINT, "SP014"),
        (FEED_FLOW_HIGH_SETPOINT, "SP015"),
    ]
    .into_iter()
    .map(|(tag, sensor)| (tag.to_string(), sensor.to_string()))
    .collect()
}

/// Required tags that have no entry in `mapping`.
pub fn missing_from_mapping(mapping: &TagMapping) -> Vec<String> {
    Tag::required()
        .filter(|tag| !mapping.contains_key(tag.name()))
        .map(|tag| tag.name().to_string())
        .collect()
}
