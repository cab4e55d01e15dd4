//! Plain metric records for a caller-supplied time-series writer.
//!
//! A [`MetricPoint`] is a measurement name with string tags and numeric
//! fields. The core only builds records; writing them is up to the caller.

use crate::types::{Direction, ProbeResult, ThroughputSample};
use serde::Serialize;
use std::collections::BTreeMap;

/// One time-series record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    /// Measurement (series) name
    pub measurement: String,
    /// Indexed string tags
    pub tags: BTreeMap<String, String>,
    /// Numeric fields
    pub fields: BTreeMap<String, f64>,
}

impl MetricPoint {
    /// Create an empty point for `measurement`
    #[must_use]
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a tag
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Serialize as a single JSON object; non-finite fields become `null`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&ThroughputSample> for MetricPoint {
    fn from(sample: &ThroughputSample) -> Self {
        let measurement = match sample.direction {
            Direction::Download => "download_speed",
            Direction::Upload => "upload_speed",
        };
        Self::new(measurement)
            .tag("server", sample.server_host.clone())
            .field("Mbps", sample.megabits_per_second)
    }
}

impl From<&ProbeResult> for MetricPoint {
    fn from(result: &ProbeResult) -> Self {
        Self::new("server_latency")
            .tag("server", result.hostname.clone())
            .field("latency_ms", result.latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_point() {
        let sample = ThroughputSample {
            direction: Direction::Upload,
            megabits_per_second: 42.5,
            server_host: "speedtest.example.net".to_string(),
            bytes: 1024,
            elapsed_ms: 10.0,
        };
        let point = MetricPoint::from(&sample);

        assert_eq!(point.measurement, "upload_speed");
        assert_eq!(point.tags["server"], "speedtest.example.net");
        assert_eq!(point.fields["Mbps"], 42.5);
    }

    #[test]
    fn test_probe_point_json() {
        let point = MetricPoint::from(&ProbeResult::new("host:8080", 12.0));
        assert_eq!(
            point.to_json().unwrap(),
            r#"{"measurement":"server_latency","tags":{"server":"host:8080"},"fields":{"latency_ms":12.0}}"#
        );
    }

    #[test]
    fn test_non_finite_field_serializes_as_null() {
        let point = MetricPoint::new("m").field("v", f64::NAN);
        assert_eq!(
            point.to_json().unwrap(),
            r#"{"measurement":"m","tags":{},"fields":{"v":null}}"#
        );
    }
}
