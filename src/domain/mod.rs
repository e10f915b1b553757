pub mod baseline;
pub mod dataset;
pub mod filters;
pub mod metrics;
pub mod tags;

pub use baseline::*;
pub use dataset::*;
pub use filters::*;
pub use metrics::*;
pub use tags::*;
