//! Bit-rate conversion with binary prefixes.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Bit-rate unit, each step a factor of 1024
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RateUnit {
    /// Bits per second
    Bps,
    /// 1024 bits per second
    Kbps,
    /// 1024² bits per second
    Mbps,
    /// 1024³ bits per second
    Gbps,
}

impl RateUnit {
    const ALL: [Self; 4] = [Self::Bps, Self::Kbps, Self::Mbps, Self::Gbps];

    /// Unit label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bps => "bps",
            Self::Kbps => "Kbps",
            Self::Mbps => "Mbps",
            Self::Gbps => "Gbps",
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bit rate scaled to the largest unit that keeps the value below 1024.
///
/// Rates above 1024 Gbps stay in Gbps.
///
/// # Example
///
/// ```
/// use netsonde_core::BitRate;
///
/// assert_eq!(BitRate::from_bits_per_second(1536.0).to_string(), "1.50 Kbps");
/// assert_eq!(BitRate::from_bytes_per_ms(1_500_000.0).to_string(), "11.18 Gbps");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BitRate {
    /// Scaled value
    pub value: f64,
    /// Unit the value is expressed in
    pub unit: RateUnit,
}

impl BitRate {
    /// Scale a raw bits-per-second figure
    #[must_use]
    pub fn from_bits_per_second(bps: f64) -> Self {
        let mut value = bps.max(0.0);
        let mut unit_idx = 0;

        while value >= 1024.0 && unit_idx < RateUnit::ALL.len() - 1 {
            value /= 1024.0;
            unit_idx += 1;
        }

        Self {
            value,
            unit: RateUnit::ALL[unit_idx],
        }
    }

    /// Scale a bytes-per-millisecond figure (`× 8000` to bits per second)
    #[must_use]
    pub fn from_bytes_per_ms(bytes_per_ms: f64) -> Self {
        Self::from_bits_per_second(bytes_per_ms * 8000.0)
    }

    /// Rate of `bytes` moved in `elapsed`
    #[must_use]
    pub fn from_transfer(bytes: u64, elapsed: Duration) -> Self {
        Self::from_bits_per_second(bits_per_second(bytes, elapsed))
    }
}

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit)
    }
}

/// Bits per second for `bytes` moved in `elapsed`.
///
/// A zero-length clock reading is treated as one microsecond.
#[must_use]
pub fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let elapsed_ms = elapsed.max(Duration::from_micros(1)).as_secs_f64() * 1_000.0;
    (bytes as f64 * 8000.0) / elapsed_ms
}

/// Binary megabits per second (`bps / 1024²`)
#[must_use]
pub fn megabits_per_second(bps: f64) -> f64 {
    bps / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_boundaries() {
        assert_eq!(BitRate::from_bits_per_second(0.0).to_string(), "0.00 bps");
        assert_eq!(BitRate::from_bits_per_second(1023.0).to_string(), "1023.00 bps");
        assert_eq!(BitRate::from_bits_per_second(1024.0).to_string(), "1.00 Kbps");
        assert_eq!(
            BitRate::from_bits_per_second(1024.0 * 1024.0).to_string(),
            "1.00 Mbps"
        );
        assert_eq!(
            BitRate::from_bits_per_second(1024.0_f64.powi(3)).to_string(),
            "1.00 Gbps"
        );
    }

    #[test]
    fn test_gbps_scaling_from_bytes_per_ms() {
        let rate = BitRate::from_bytes_per_ms(1_500_000.0);
        assert_eq!(rate.unit, RateUnit::Gbps);

        let expected = 1_500_000.0 * 8000.0 / 1024.0_f64.powi(3);
        assert!((rate.value - expected).abs() < 1e-9);
        assert_eq!(rate.to_string(), "11.18 Gbps");
    }

    #[test]
    fn test_rates_beyond_gbps_stay_in_gbps() {
        let rate = BitRate::from_bits_per_second(1024.0_f64.powi(4) * 3.0);
        assert_eq!(rate.unit, RateUnit::Gbps);
        assert_eq!(rate.to_string(), "3072.00 Gbps");
    }

    #[test]
    fn test_from_transfer() {
        // 1 MiB in one second is 8 Mibit/s
        let rate = BitRate::from_transfer(1024 * 1024, Duration::from_secs(1));
        assert_eq!(rate.to_string(), "8.00 Mbps");
        assert_eq!(megabits_per_second(bits_per_second(1024 * 1024, Duration::from_secs(1))), 8.0);
    }

    #[test]
    fn test_zero_elapsed_is_finite() {
        assert!(bits_per_second(1000, Duration::ZERO).is_finite());
    }
}
