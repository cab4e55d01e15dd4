//! Candidate servers and their coordinates.

use netsonde_core::UPLOAD_PATH;
use url::Url;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse textual coordinates; `None` unless both are finite numbers
    #[must_use]
    pub fn parse(latitude: &str, longitude: &str) -> Option<Self> {
        let latitude: f64 = latitude.trim().parse().ok()?;
        let longitude: f64 = longitude.trim().parse().ok()?;

        if latitude.is_finite() && longitude.is_finite() {
            Some(Self::new(latitude, longitude))
        } else {
            None
        }
    }

    /// Planar distance in degrees.
    ///
    /// Treats latitude/longitude as Cartesian axes. Coarse, but enough to
    /// order a few hundred candidates without trigonometry.
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        let d_lat = other.latitude - self.latitude;
        let d_lon = other.longitude - self.longitude;
        (d_lat * d_lat + d_lon * d_lon).sqrt()
    }
}

/// A server entry as listed in the directory, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRecord {
    /// `url` attribute
    pub url: Option<String>,
    /// `lat` attribute
    pub lat: Option<String>,
    /// `lon` attribute
    pub lon: Option<String>,
}

impl CandidateRecord {
    /// Record with all three attributes present
    #[must_use]
    pub fn new(url: impl Into<String>, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            lat: Some(lat.into()),
            lon: Some(lon.into()),
        }
    }
}

/// A validated candidate server
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Upload endpoint URL
    pub url: String,
    /// Server position
    pub position: Coordinates,
}

impl Candidate {
    /// Create a candidate
    #[must_use]
    pub fn new(url: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            url: url.into(),
            position: Coordinates::new(latitude, longitude),
        }
    }
}

impl TryFrom<&CandidateRecord> for Candidate {
    type Error = &'static str;

    fn try_from(record: &CandidateRecord) -> Result<Self, Self::Error> {
        let url = record
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or("missing url")?;
        let (Some(lat), Some(lon)) = (record.lat.as_deref(), record.lon.as_deref()) else {
            return Err("missing coordinates");
        };
        let position = Coordinates::parse(lat, lon).ok_or("unparseable coordinates")?;

        Ok(Self {
            url: url.to_string(),
            position,
        })
    }
}

/// Extract `host[:port]` from a plain-HTTP upload endpoint URL.
///
/// Only URLs of the form `http://<host>/speedtest/upload.php` qualify; any
/// other scheme or path yields `None`.
///
/// # Example
///
/// ```
/// use netsonde_discovery::upload_host;
///
/// assert_eq!(
///     upload_host("http://speedtest.example.net:8080/speedtest/upload.php").as_deref(),
///     Some("speedtest.example.net:8080")
/// );
/// assert_eq!(upload_host("https://speedtest.example.net/speedtest/upload.php"), None);
/// ```
#[must_use]
pub fn upload_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if parsed.scheme() != "http" || parsed.path() != UPLOAD_PATH {
        return None;
    }

    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_parse() {
        assert_eq!(
            Coordinates::parse("40.7128", " -74.0060 "),
            Some(Coordinates::new(40.7128, -74.006))
        );
        assert_eq!(Coordinates::parse("north", "0"), None);
        assert_eq!(Coordinates::parse("", "0"), None);
        assert_eq!(Coordinates::parse("NaN", "0"), None);
        assert_eq!(Coordinates::parse("0", "inf"), None);
    }

    #[test]
    fn test_planar_distance() {
        let origin = Coordinates::new(0.0, 0.0);
        assert_eq!(origin.planar_distance(&Coordinates::new(3.0, 4.0)), 5.0);
        assert_eq!(origin.planar_distance(&origin), 0.0);
        assert_eq!(
            Coordinates::new(1.0, 1.0).planar_distance(&Coordinates::new(-2.0, 5.0)),
            5.0
        );
    }

    #[test]
    fn test_candidate_from_record() {
        let record = CandidateRecord::new("http://a.example/speedtest/upload.php", "1.5", "2.5");
        let candidate = Candidate::try_from(&record).unwrap();
        assert_eq!(candidate.url, "http://a.example/speedtest/upload.php");
        assert_eq!(candidate.position, Coordinates::new(1.5, 2.5));
    }

    #[test]
    fn test_candidate_rejects_malformed_records() {
        let missing_url = CandidateRecord {
            url: None,
            lat: Some("1".into()),
            lon: Some("1".into()),
        };
        assert_eq!(Candidate::try_from(&missing_url), Err("missing url"));

        let missing_lon = CandidateRecord {
            url: Some("http://a/speedtest/upload.php".into()),
            lat: Some("1".into()),
            lon: None,
        };
        assert_eq!(Candidate::try_from(&missing_lon), Err("missing coordinates"));

        let bad_lat = CandidateRecord::new("http://a/speedtest/upload.php", "abc", "1");
        assert_eq!(Candidate::try_from(&bad_lat), Err("unparseable coordinates"));
    }

    #[test]
    fn test_upload_host() {
        assert_eq!(
            upload_host("http://speedtest.example.net/speedtest/upload.php").as_deref(),
            Some("speedtest.example.net")
        );
        assert_eq!(
            upload_host("http://10.0.0.7:8080/speedtest/upload.php").as_deref(),
            Some("10.0.0.7:8080")
        );
        assert_eq!(
            upload_host("http://[2001:db8::1]:8080/speedtest/upload.php").as_deref(),
            Some("[2001:db8::1]:8080")
        );
        assert_eq!(upload_host("http://a.example/speedtest/upload.asp"), None);
        assert_eq!(upload_host("http://a.example/other/speedtest/upload.php"), None);
        assert_eq!(upload_host("ftp://a.example/speedtest/upload.php"), None);
        assert_eq!(upload_host("not a url"), None);
    }
}
