//! Quantity catalog
//!
//! Every intermediate and output quantity the engine knows, the inputs each
//! one reads, and the baseline scalars the normalized outputs are referenced
//! against. The dependency graph is fixed and acyclic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

use crate::domain::{NormalizedMetric, Tag};

/// A computed column
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
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
pub enum Quantity {
    /// Feed temperature in °C
    #[strum(serialize = "TT_1_C")]
    TemperatureC,
    /// Arrhenius exponent base for the temperature correction
    #[strum(serialize = "coefficient")]
    Coefficient,
    #[strum(serialize = "temperature_correction_factor")]
    TemperatureCorrectionFactor,
    #[strum(serialize = "lead_element_flow")]
    LeadElementFlow,
    #[strum(serialize = "module_recovery")]
    ModuleRecovery,
    #[strum(serialize = "feed_cond_C")]
    FeedCondC,
    /// Log-mean feed/reject conductivity
    #[strum(serialize = "feed_reject_cond_C")]
    FeedRejectCondC,
    #[strum(serialize = "osmotic_pressure")]
    OsmoticPressure,
    /// Permeate-side osmotic pressure
    #[strum(serialize = "osmotic_pressure_Posmo_p")]
    OsmoticPressurePosmoP,
    #[strum(serialize = "trans_membrane_pressure")]
    TransMembranePressure,
    #[strum(serialize = "operating_flux")]
    OperatingFlux,
    #[strum(serialize = "avg_feed")]
    AvgFeed,
    #[strum(serialize = "avg_membrane_rejection")]
    AvgMembraneRejection,

    #[strum(serialize = "normalized_permeate_flow")]
    NormalizedPermeateFlow,
    #[strum(serialize = "normalized_differential_pressure")]
    NormalizedDifferentialPressure,
    #[strum(serialize = "normalized_permeate_TDS")]
    NormalizedPermeateTds,
    #[strum(serialize = "net_driving_pressure")]
    NetDrivingPressure,
    #[strum(serialize = "normalized_flux")]
    NormalizedFlux,
    #[strum(serialize = "normalized_salt_passage")]
    NormalizedSaltPassage,
    #[strum(serialize = "normalized_specific_flux")]
    NormalizedSpecificFlux,
}

/// Something a formula reads: a raw tag or another catalog quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Tag(Tag),
    Quantity(Quantity),
}

/// Baseline-derived reference values used by normalized outputs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
pub enum BaselineScalar {
    TransMembranePressure,
    TemperatureCorrectionFactor,
    FeedRejectCondC,
    OsmoticPressurePosmoP,
}

impl BaselineScalar {
    /// The quantity evaluated on the baseline row to obtain this scalar
    pub fn quantity(self) -> Quantity {
        match self {
            BaselineScalar::TransMembranePressure => Quantity::TransMembranePressure,
            BaselineScalar::TemperatureCorrectionFactor => Quantity::TemperatureCorrectionFactor,
            BaselineScalar::FeedRejectCondC => Quantity::FeedRejectCondC,
            BaselineScalar::OsmoticPressurePosmoP => Quantity::OsmoticPressurePosmoP,
        }
    }
}

use Input::{Quantity as Q, Tag as T};

impl Quantity {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Direct inputs of this quantity's formula
    pub fn dependencies(self) -> &'static [Input] {
        match self {
            Quantity::TemperatureC => &[T(Tag::Tt1)],
            Quantity::Coefficient => &[Q(Quantity::TemperatureC)],
            Quantity::TemperatureCorrectionFactor => {
                &[Q(Quantity::Coefficient), Q(Quantity::TemperatureC)]
            }
            Quantity::LeadElementFlow => &[T(Tag::Fit1), T(Tag::Fit2), T(Tag::Fit3)],
            Quantity::ModuleRecovery => &[Q(Quantity::LeadElementFlow), T(Tag::Fit3)],
            Quantity::FeedCondC => &[T(Tag::Cit1), T(Tag::Cit2), Q(Quantity::ModuleRecovery)],
            Quantity::FeedRejectCondC => &[Q(Quantity::ModuleRecovery), Q(Quantity::FeedCondC)],
            Quantity::OsmoticPressure => &[Q(Quantity::FeedRejectCondC), Q(Quantity::TemperatureC)],
            Quantity::OsmoticPressurePosmoP => &[T(Tag::Cit3), Q(Quantity::TemperatureC)],
            Quantity::TransMembranePressure => &[
                T(Tag::Pt2),
                T(Tag::Pt3),
                T(Tag::Pt7),
                Q(Quantity::OsmoticPressure),
            ],
            Quantity::OperatingFlux => &[T(Tag::Fit3)],
            Quantity::AvgFeed => &[T(Tag::Cit1), T(Tag::Cit2)],
            Quantity::AvgMembraneRejection => &[Q(Quantity::AvgFeed), T(Tag::Cit3)],

            Quantity::NormalizedPermeateFlow => &[
                T(Tag::Fit3),
                Q(Quantity::TransMembranePressure),
                Q(Quantity::TemperatureCorrectionFactor),
            ],
            Quantity::NormalizedDifferentialPressure => &[
                T(Tag::Pt2),
                T(Tag::Pt3),
                Q(Quantity::TemperatureCorrectionFactor),
            ],
            Quantity::NormalizedPermeateTds => &[
                T(Tag::Cit3),
                Q(Quantity::TransMembranePressure),
                Q(Quantity::OsmoticPressurePosmoP),
                Q(Quantity::FeedRejectCondC),
            ],
            Quantity::NetDrivingPressure => &[
                T(Tag::Pt2),
                T(Tag::Pt3),
                T(Tag::Pt7),
                Q(Quantity::OsmoticPressure),
                Q(Quantity::OsmoticPressurePosmoP),
            ],
            Quantity::NormalizedFlux => &[
                Q(Quantity::OperatingFlux),
                Q(Quantity::TransMembranePressure),
                Q(Quantity::TemperatureCorrectionFactor),
            ],
            Quantity::NormalizedSaltPassage => &[
                Q(Quantity::AvgMembraneRejection),
                Q(Quantity::TemperatureCorrectionFactor),
            ],
            Quantity::NormalizedSpecificFlux => {
                &[Q(Quantity::NormalizedFlux), Q(Quantity::NetDrivingPressure)]
            }
        }
    }

    /// Baseline scalars read directly by this quantity's formula
    pub fn baseline_scalars(self) -> &'static [BaselineScalar] {
        use BaselineScalar::*;
        match self {
            Quantity::NormalizedPermeateFlow | Quantity::NormalizedFlux => {
                &[TransMembranePressure, TemperatureCorrectionFactor]
            }
            Quantity::NormalizedDifferentialPressure | Quantity::NormalizedSaltPassage => {
                &[TemperatureCorrectionFactor]
            }
            Quantity::NormalizedPermeateTds => {
                &[TransMembranePressure, FeedRejectCondC, OsmoticPressurePosmoP]
            }
            _ => &[],
        }
    }

    /// Baseline scalars needed by this quantity and everything it depends on
    pub fn required_baseline_scalars(self) -> BTreeSet<BaselineScalar> {
        let mut scalars: BTreeSet<BaselineScalar> =
            self.baseline_scalars().iter().copied().collect();
        for input in self.dependencies() {
            if let Input::Quantity(dependency) = input {
                scalars.extend(dependency.required_baseline_scalars());
            }
        }
        scalars
    }

    /// Raw tags read by this quantity and everything it depends on
    pub fn required_tags(self) -> BTreeSet<Tag> {
        let mut tags = BTreeSet::new();
        for input in self.dependencies() {
            match input {
                Input::Tag(tag) => {
                    tags.insert(*tag);
                }
                Input::Quantity(dependency) => tags.extend(dependency.required_tags()),
            }
        }
        tags
    }
}

impl From<NormalizedMetric> for Quantity {
    fn from(metric: NormalizedMetric) -> Self {
        match metric {
            NormalizedMetric::PermeateFlow => Quantity::NormalizedPermeateFlow,
            NormalizedMetric::DifferentialPressure => Quantity::NormalizedDifferentialPressure,
            NormalizedMetric::PermeateTds => Quantity::NormalizedPermeateTds,
            NormalizedMetric::NetDrivingPressure => Quantity::NetDrivingPressure,
            NormalizedMetric::Flux => Quantity::NormalizedFlux,
            NormalizedMetric::SaltPassage => Quantity::NormalizedSaltPassage,
            NormalizedMetric::SpecificFlux => Quantity::NormalizedSpecificFlux,
        }
    }
}
