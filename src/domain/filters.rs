use serde::{Deserialize, Serialize};

/// Closed interval `[low, high]` of acceptable values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub low: f64,
    #[serde(default = "unbounded")]
    pub high: f64,
}

fn unbounded() -> f64 {
    f64::INFINITY
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: f64::INFINITY,
        }
    }
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True when `value` lies inside the interval (both ends inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Row-quality bounds. Recovery, feed flow and reject conductivity are
/// physically non-negative, so lows default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterBounds {
    #[serde(default)]
    pub recovery: Bounds,
    #[serde(default)]
    pub feed_flow: Bounds,
    #[serde(default)]
    pub reject_conductivity: Bounds,
}

impl FilterBounds {
    pub fn new(recovery: Bounds, feed_flow: Bounds, reject_conductivity: Bounds) -> Self {
        Self {
            recovery,
            feed_flow,
            reject_conductivity,
        }
    }

    /// Named view over the three intervals, used for logging and clamping
    pub fn named_mut(&mut self) -> [(&'static str, &mut Bounds); 3] {
        [
            ("Recovery", &mut self.recovery),
            ("FeedFlow", &mut self.feed_flow),
            ("RejectConductivity", &mut self.reject_conductivity),
        ]
    }
}

/// What the quality filter does with a row outside its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Remove the row, and any row whose quality columns are all missing
    #[default]
    DropRows,
    /// Set the row's quality columns to missing and keep it
    NullColumns,
}
