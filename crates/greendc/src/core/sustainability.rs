//! Hourly sustainability data feed driving pool state updates.

use std::collections::BTreeMap;
use std::fs::File;

use log::info;
use serde::{Deserialize, Serialize};

/// One pool's sustainability figures for a single hour.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct SustainabilityReading {
    pub renewable_generation_mw: f64,
    /// Carbon intensity of consumed grid energy in gCO2/kWh.
    pub carbon_intensity: f64,
    pub renewable_pct: f64,
}

/// Readings for one hour keyed by pool id.
pub type HourlyRecord = BTreeMap<u32, SustainabilityReading>;

pub trait SustainabilityDataset {
    /// Returns the readings for the given hour (if the feed covers it).
    fn hourly_record(&self, hour: usize) -> Option<HourlyRecord>;
}

/// Feed that repeats the same readings every hour, mainly for tests and demos.
#[derive(Clone, Default)]
pub struct StaticSustainability {
    record: HourlyRecord,
}

impl StaticSustainability {
    pub fn new(record: HourlyRecord) -> Self {
        Self { record }
    }
}

impl SustainabilityDataset for StaticSustainability {
    fn hourly_record(&self, _hour: usize) -> Option<HourlyRecord> {
        Some(self.record.clone())
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct SustainabilityRow {
    hour: usize,
    pool_id: u32,
    renewable_generation_mw: f64,
    carbon_intensity: f64,
    renewable_pct: f64,
}

/// Reader for CSV feeds with one row per (hour, pool) pair.
///
/// Expected header:
/// `hour,pool_id,renewable_generation_mw,carbon_intensity,renewable_pct`.
pub struct CsvSustainabilityReader {
    records: Vec<HourlyRecord>,
}

impl CsvSustainabilityReader {
    pub fn from_file(file_name: &str) -> Self {
        let file = File::open(file_name).unwrap_or_else(|_| panic!("Can't open file {}", file_name));
        let mut reader = csv::Reader::from_reader(file);
        let mut records: Vec<HourlyRecord> = Vec::new();
        for record in reader.deserialize() {
            let row: SustainabilityRow = record.unwrap();
            if records.len() <= row.hour {
                records.resize_with(row.hour + 1, HourlyRecord::new);
            }
            records[row.hour].insert(
                row.pool_id,
                SustainabilityReading {
                    renewable_generation_mw: row.renewable_generation_mw,
                    carbon_intensity: row.carbon_intensity,
                    renewable_pct: row.renewable_pct,
                },
            );
        }
        info!("Read sustainability feed covering {} hours", records.len());
        Self { records }
    }

    /// Number of hours covered by the feed.
    pub fn horizon(&self) -> usize {
        self.records.len()
    }
}

impl SustainabilityDataset for CsvSustainabilityReader {
    fn hourly_record(&self, hour: usize) -> Option<HourlyRecord> {
        self.records.get(hour).cloned()
    }
}
