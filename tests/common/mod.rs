#![allow(dead_code)]
use chrono::{DateTime, Duration, TimeZone, Utc};
use membrane_normalization::acquisition::MemoryTimeseriesSource;
use membrane_normalization::domain::{default_tag_mapping, BaselineRecord, Dataset, Tag};

pub const SYSTEM_ID: &str = "WEST_MORGAN_1_RO1";

pub fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap()
}

/// Typical operating value for a tag on a healthy train
pub fn nominal(tag: Tag) -> f64 {
    match tag {
        Tag::Ait1 => 7.2,
        Tag::Cit1 => 820.0,
        Tag::Cit2 => 3.9,
        Tag::Cit3 => 24.0,
        Tag::Fit1 => 40.0,
        Tag::Fit2 => 6.0,
        Tag::Fit3 => 31.0,
        Tag::LastCcdVr => 78.0,
        Tag::ModuleDp => 12.0,
        Tag::Pt2 => 185.0,
        Tag::Pt3 => 172.0,
        Tag::Pt7 => 9.0,
        Tag::Tt1 => 66.0,
        Tag::VolumetricRecovery => 80.0,
    }
}

/// `rows` samples five minutes apart, columns keyed by sensor id as a
/// historian would store them. Values drift slightly from row to row.
pub fn history(start: DateTime<Utc>, rows: usize) -> Dataset {
    let mapping = default_tag_mapping();
    let times = (0..rows as i64).map(|i| start + Duration::minutes(5 * i)).collect();
    Tag::required().fold(Dataset::new(times), |data, tag| {
        let values = (0..rows)
            .map(|i| Some(nominal(tag) * (1.0 + 0.002 * i as f64)))
            .collect();
        data.with_column(mapping[tag.name()].clone(), values)
    })
}

pub fn source_with(data: Dataset) -> MemoryTimeseriesSource {
    MemoryTimeseriesSource::new().with_system(SYSTEM_ID, data)
}

pub fn nominal_baseline(time: Option<DateTime<Utc>>) -> BaselineRecord {
    Tag::required().fold(BaselineRecord::new(time), |record, tag| {
        record.with_value(tag, Some(nominal(tag)))
    })
}
