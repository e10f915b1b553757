//! Closed-form formulas behind every catalog quantity.
//!
//! Each formula yields `Option<f64>`: `None` stands for a missing operand, a
//! zero denominator or a domain error. [`evaluate`] turns that, and any
//! non-finite result, into [`DEGRADED_VALUE`] so one bad row never aborts a
//! dataset.

use super::catalog::{BaselineScalar, Quantity};
use crate::domain::Tag;

/// Value recorded for a row whose formula could not be evaluated
pub const DEGRADED_VALUE: f64 = 0.0;

/// Reject conductivity above which the high-salinity osmotic correlation applies
pub const HIGH_SALINITY_THRESHOLD: f64 = 20_000.0;
/// psi per bar
const PSI_PER_BAR: f64 = 14.23;
/// Fraction of conductivity counted as dissolved solids
const TDS_FACTOR: f64 = 0.67;
/// Above this feed temperature (°C) the low-activation coefficient is used
const COEFFICIENT_SWITCH_C: f64 = 25.0;
const COEFFICIENT_WARM: f64 = 2640.0;
const COEFFICIENT_COLD: f64 = 3020.0;
/// Lead element flow includes recirculation when feed and permeate differ by less than this
const RECIRCULATION_GAP_GPM: f64 = 2.0;

/// Values a formula can read for one row
pub trait RowInputs {
    fn tag(&self, tag: Tag) -> Option<f64>;
    fn quantity(&self, quantity: Quantity) -> Option<f64>;
    fn baseline(&self, scalar: BaselineScalar) -> Option<f64>;
}

/// Apply the degrade-to-zero policy to a formula outcome
pub fn degrade(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(DEGRADED_VALUE)
}

/// Compute `quantity` for one row. Always finite.
pub fn evaluate(quantity: Quantity, row: &impl RowInputs) -> f64 {
    degrade(formula(quantity, row))
}

fn formula(quantity: Quantity, row: &impl RowInputs) -> Option<f64> {
    use BaselineScalar as B;
    use Quantity::*;

    let q = |quantity: Quantity| row.quantity(quantity);
    let t = |tag: Tag| row.tag(tag);
    let b = |scalar: BaselineScalar| row.baseline(scalar);

    match quantity {
        TemperatureC => Some(temperature_c(t(Tag::Tt1))),
        Coefficient => Some(coefficient(q(TemperatureC)?)),
        TemperatureCorrectionFactor => {
            Some(temperature_correction_factor(q(Coefficient)?, q(TemperatureC)?))
        }
        LeadElementFlow => lead_element_flow(t(Tag::Fit1), t(Tag::Fit2), t(Tag::Fit3)),
        ModuleRecovery => module_recovery(q(LeadElementFlow)?, t(Tag::Fit3)?),
        FeedCondC => Some(feed_cond_c(t(Tag::Cit1)?, t(Tag::Cit2)?, q(ModuleRecovery)?)),
        FeedRejectCondC => feed_reject_cond_c(q(FeedCondC)?, q(ModuleRecovery)?),
        OsmoticPressure => Some(osmotic_pressure(q(FeedRejectCondC)?, q(TemperatureC)?)),
        OsmoticPressurePosmoP => Some(permeate_osmotic_pressure(t(Tag::Cit3)?, q(TemperatureC)?)),
        TransMembranePressure => Some(trans_membrane_pressure(
            t(Tag::Pt2)?,
            t(Tag::Pt3)?,
            t(Tag::Pt7)?,
            q(OsmoticPressure)?,
        )),
        OperatingFlux => Some(operating_flux(t(Tag::Fit3)?)),
        AvgFeed => avg_feed(t(Tag::Cit1)?, t(Tag::Cit2)?),
        AvgMembraneRejection => avg_membrane_rejection(q(AvgFeed)?, t(Tag::Cit3)?),

        NormalizedPermeateFlow => baseline_relative(
            t(Tag::Fit3)?,
            (b(B::TransMembranePressure)?, q(TransMembranePressure)?),
            (b(B::TemperatureCorrectionFactor)?, q(TemperatureCorrectionFactor)?),
        ),
        NormalizedDifferentialPressure => Some(
            (t(Tag::Pt2)? - t(Tag::Pt3)?)
                * ratio(b(B::TemperatureCorrectionFactor)?, q(TemperatureCorrectionFactor)?)?,
        ),
        NormalizedPermeateTds => normalized_permeate_tds(
            t(Tag::Cit3)?,
            (q(TransMembranePressure)?, q(OsmoticPressurePosmoP)?, q(FeedRejectCondC)?),
            (
                b(B::TransMembranePressure)?,
                b(B::OsmoticPressurePosmoP)?,
                b(B::FeedRejectCondC)?,
            ),
        ),
        NetDrivingPressure => Some(net_driving_pressure(
            t(Tag::Pt2)?,
            t(Tag::Pt3)?,
            t(Tag::Pt7)?,
            q(OsmoticPressure)?,
            q(OsmoticPressurePosmoP)?,
        )),
        NormalizedFlux => baseline_relative(
            q(OperatingFlux)?,
            (b(B::TransMembranePressure)?, q(TransMembranePressure)?),
            (b(B::TemperatureCorrectionFactor)?, q(TemperatureCorrectionFactor)?),
        ),
        NormalizedSaltPassage => {
            let correction =
                ratio(b(B::TemperatureCorrectionFactor)?, q(TemperatureCorrectionFactor)?)?;
            Some(100.0 * (1.0 - q(AvgMembraneRejection)?) / nonzero(correction)?)
        }
        NormalizedSpecificFlux => Some(q(NormalizedFlux)? / nonzero(q(NetDrivingPressure)?)?),
    }
}

fn nonzero(value: f64) -> Option<f64> {
    (value != 0.0 && !value.is_nan()).then_some(value)
}

/// `reference / current`, undefined when `current` is zero
fn ratio(reference: f64, current: f64) -> Option<f64> {
    Some(reference / nonzero(current)?)
}

/// `value * (b_tmp / tmp) * (b_tcf / tcf)`
fn baseline_relative(value: f64, tmp: (f64, f64), tcf: (f64, f64)) -> Option<f64> {
    Some(value * ratio(tmp.0, tmp.1)? * ratio(tcf.0, tcf.1)?)
}

/// Feed temperature in °C from °F. A missing reading counts as 0 °C.
pub fn temperature_c(raw_f: Option<f64>) -> f64 {
    match raw_f {
        Some(f) if !f.is_nan() => (f - 32.0) / 1.8,
        _ => 0.0,
    }
}

/// Exponent base of the temperature correction; 25 °C itself is cold
pub fn coefficient(temperature_c: f64) -> f64 {
    if temperature_c > COEFFICIENT_SWITCH_C {
        COEFFICIENT_WARM
    } else {
        COEFFICIENT_COLD
    }
}

/// `exp(coefficient * (1/298 - 1/(273 + T)))`
pub fn temperature_correction_factor(coefficient: f64, temperature_c: f64) -> f64 {
    (coefficient * ((1.0 / 298.0) - (1.0 / (273.0 + temperature_c)))).exp()
}

/// Flow entering the lead element
pub fn lead_element_flow(fit1: Option<f64>, fit2: Option<f64>, fit3: Option<f64>) -> Option<f64> {
    let (fit1, fit3) = (fit1?, fit3?);
    if fit1 - fit3 < RECIRCULATION_GAP_GPM {
        Some(fit1 + fit2?)
    } else {
        Some(fit1)
    }
}

pub fn module_recovery(lead_element_flow: f64, fit3: f64) -> Option<f64> {
    Some(fit3 / nonzero(lead_element_flow)?)
}

/// Feed conductivity blended from fresh feed and recirculated concentrate
pub fn feed_cond_c(cit1: f64, cit2: f64, recovery: f64) -> f64 {
    (cit1 * recovery) + ((cit2 * 1_000.0) * (1.0 - recovery) * TDS_FACTOR)
}

/// Concentration-polarization average `feed * ln(1 / (1 - r)) / r`
pub fn feed_reject_cond_c(feed_cond: f64, recovery: f64) -> Option<f64> {
    let log_term = (1.0 / nonzero(1.0 - recovery)?).ln();
    if log_term.is_nan() {
        return None;
    }
    Some(feed_cond * (log_term / nonzero(recovery)?))
}

/// Feed-side osmotic pressure (bar)
pub fn osmotic_pressure(feed_reject_cond: f64, temperature_c: f64) -> f64 {
    if feed_reject_cond < HIGH_SALINITY_THRESHOLD {
        feed_reject_cond * (temperature_c + 320.0) / 491_000.0
    } else {
        ((0.0117 * feed_reject_cond) - (34.0 / PSI_PER_BAR)) * ((temperature_c + 320.0) / 345.0)
    }
}

/// Permeate-side osmotic pressure (bar)
pub fn permeate_osmotic_pressure(cit3: f64, temperature_c: f64) -> f64 {
    cit3 * (temperature_c + 320.0) / 491_000.0
}

/// Trans-membrane pressure (bar)
pub fn trans_membrane_pressure(pt2: f64, pt3: f64, pt7: f64, osmotic_pressure: f64) -> f64 {
    (((pt2 + pt3) / 2.0) / PSI_PER_BAR) - (pt7 / PSI_PER_BAR) - osmotic_pressure
}

/// Net driving pressure (psi)
pub fn net_driving_pressure(
    pt2: f64,
    pt3: f64,
    pt7: f64,
    osmotic_pressure: f64,
    permeate_osmotic_pressure: f64,
) -> f64 {
    -(((pt2 - pt3) / 2.0) - pt7 - (osmotic_pressure * PSI_PER_BAR)
        + (permeate_osmotic_pressure * PSI_PER_BAR))
}

/// Permeate flux over the installed membrane area
pub fn operating_flux(fit3: f64) -> f64 {
    fit3 * 1440.0 / 1200.0
}

/// Log-mean feed conductivity between feed (uS/cm) and reject (mS/cm)
pub fn avg_feed(cit1: f64, cit2: f64) -> Option<f64> {
    let (cit1, reject) = (nonzero(cit1)?, nonzero(cit2)? * 1_000.0);
    let log_term = (reject / cit1).ln();
    if log_term.is_nan() {
        return None;
    }
    Some((cit1 * log_term) / nonzero(1.0 - (cit1 / reject))?)
}

pub fn avg_membrane_rejection(avg_feed: f64, cit3: f64) -> Option<f64> {
    Some((avg_feed - cit3) / nonzero(avg_feed)?)
}

fn normalized_permeate_tds(
    cit3: f64,
    (tmp, posmo, feed_reject): (f64, f64, f64),
    (b_tmp, b_posmo, b_feed_reject): (f64, f64, f64),
) -> Option<f64> {
    Some(
        (cit3 * TDS_FACTOR)
            * ((tmp + posmo) / nonzero(b_tmp + b_posmo)?)
            * ratio(b_feed_reject, feed_reject)?,
    )
}
