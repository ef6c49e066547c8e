//! Raw sensor readings and the two input shapes they arrive in.
//!
//! The historical endpoint nests a time series under each floor/zone pair,
//! the live endpoint returns one flat reading per zone. Both are flattened
//! into [`Reading`] before any aggregation happens.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One occupancy sample for a single zone at a single timestamp.
///
/// `total_occupancy` and `occupancy_percentage` are signed: sensor drift can
/// push them below zero and they are kept as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub floor_id: String,
    pub zone_name: String,
    pub timestamp: String,
    pub total_occupancy: f64,
    pub occupancy_percentage: f64,
    #[serde(default)]
    pub max_capacity: Option<f64>,
}

impl Reading {
    /// Hour of day (UTC) of the reading's timestamp.
    ///
    /// Accepts RFC 3339 and offset-less `YYYY-MM-DDTHH:MM:SS`, the latter
    /// taken as UTC. Returns `None` when the timestamp does not parse.
    pub fn hour_utc(&self) -> Option<u32> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc).hour());
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|ts| ts.hour())
    }
}

/// A point of a historical series; floor and zone are hoisted to the parent.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: String,
    pub total_occupancy: f64,
    pub occupancy_percentage: f64,
    #[serde(default)]
    pub max_capacity: Option<f64>,
}

/// One floor/zone entry of the historical (hourly) endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSeries {
    pub floor_id: String,
    pub zone_name: String,
    #[serde(default)]
    pub data: Vec<SeriesPoint>,
}

impl ZoneSeries {
    /// Expands the series into flat readings, copying floor and zone onto each.
    pub fn into_readings(self) -> impl Iterator<Item = Reading> {
        let ZoneSeries {
            floor_id,
            zone_name,
            data,
        } = self;
        data.into_iter().map(move |p| Reading {
            floor_id: floor_id.clone(),
            zone_name: zone_name.clone(),
            timestamp: p.timestamp,
            total_occupancy: p.total_occupancy,
            occupancy_percentage: p.occupancy_percentage,
            max_capacity: p.max_capacity,
        })
    }
}

/// Parses a historical endpoint body and flattens it into readings.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array of zone series.
pub fn parse_historical(bytes: &[u8]) -> Result<Vec<Reading>> {
    let series: Vec<ZoneSeries> =
        serde_json::from_slice(bytes).context("invalid historical occupancy payload")?;
    Ok(series.into_iter().flat_map(ZoneSeries::into_readings).collect())
}

/// Parses a live endpoint body: a flat array of readings.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array of readings.
pub fn parse_live(bytes: &[u8]) -> Result<Vec<Reading>> {
    serde_json::from_slice(bytes).context("invalid live occupancy payload")
}
