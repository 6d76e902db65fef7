//! Parsing of `POINT (<lon> <lat>)` geocoordinate strings.

use regex::Regex;
use std::sync::LazyLock;

static POINT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$").expect("POINT pattern is valid")
});

/// A parsed coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Longitude (first token).
    pub longitude: f64,
    /// Latitude (second token).
    pub latitude: f64,
}

/// Parses a well-known-text point. Missing, placeholder, malformed or
/// non-numeric input yields `None`; this never fails.
#[must_use]
pub fn parse_point(value: Option<&str>) -> Option<Coordinates> {
    let caps = POINT.captures(value?)?;
    let longitude = caps[1].parse::<f64>().ok().filter(|v| v.is_finite())?;
    let latitude = caps[2].parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Coordinates {
        longitude,
        latitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let c = parse_point(Some("POINT (-122.33 47.60)")).unwrap();
        assert!((c.longitude - -122.33).abs() < 1e-12);
        assert!((c.latitude - 47.60).abs() < 1e-12);
    }

    #[test]
    fn test_parse_point_extra_whitespace() {
        let c = parse_point(Some("  POINT(-117.4   47.66 ) ")).unwrap();
        assert!((c.longitude - -117.4).abs() < 1e-12);
        assert!((c.latitude - 47.66).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_points_are_none() {
        for input in [
            "Unknown",
            "",
            "POINT ()",
            "POINT (-122.33)",
            "POINT (-122.33 47.60 12.0)",
            "POINT (abc 47.60)",
            "POINT (-122.33 47.60",
            "LINESTRING (1 2, 3 4)",
            "POINT (NaN 47.60)",
        ] {
            assert_eq!(parse_point(Some(input)), None, "input: {input:?}");
        }
        assert_eq!(parse_point(None), None);
    }
}
