//! RFC3339 timestamps normalized to UTC with nanosecond precision.

use time::format_description::well_known::Rfc3339;
use time::macros::{datetime, format_description};
use time::{OffsetDateTime, UtcOffset};

/// The zero time, `0001-01-01T00:00:00Z`.
pub const ZERO_TIME: OffsetDateTime = datetime!(0001-01-01 0:00 UTC);

/// Converts `t` to UTC and renders it with exactly nine fractional digits.
///
/// Returns `None` for years outside `0..=9999`.
pub fn format(t: OffsetDateTime) -> Option<String> {
    let utc = t.to_offset(UtcOffset::UTC);
    if !(0..=9999).contains(&utc.year()) {
        return None;
    }
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
    ))
    .ok()
}

/// Parses an RFC3339 string that must end in `Z`, returning a UTC instant.
pub fn parse(s: &str) -> Result<OffsetDateTime, String> {
    if !s.ends_with('Z') {
        return Err("timestamp must be UTC and end with 'Z'".to_string());
    }
    OffsetDateTime::parse(s, &Rfc3339)
        .map(|t| t.to_offset(UtcOffset::UTC))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::offset;

    #[test]
    fn format_normalizes_offset() {
        let t = datetime!(2020-06-02 18:05:13.004346374 +2);
        assert_eq!(format(t).unwrap(), "2020-06-02T16:05:13.004346374Z");
    }

    #[test]
    fn format_pads_nanoseconds() {
        let t = datetime!(2021-01-01 0:00:00.5 UTC);
        assert_eq!(format(t).unwrap(), "2021-01-01T00:00:00.500000000Z");
        assert_eq!(format(ZERO_TIME).unwrap(), "0001-01-01T00:00:00.000000000Z");
    }

    #[test]
    fn format_rejects_negative_years() {
        let t = ZERO_TIME.replace_year(-1).unwrap();
        assert!(format(t).is_none());
    }

    #[test]
    fn parse_requires_z_suffix() {
        assert!(parse("2020-06-02T18:05:13+02:00").is_err());
        let t = parse("2020-06-02T16:05:13.004346374Z").unwrap();
        assert_eq!(t, datetime!(2020-06-02 18:05:13.004346374 +2));
        assert_eq!(t.offset(), offset!(UTC));
    }

    #[test]
    fn parse_accepts_short_fractions() {
        let t = parse("2020-06-02T16:05:13Z").unwrap();
        assert_eq!(t.nanosecond(), 0);
        let t = parse("2020-06-02T16:05:13.5Z").unwrap();
        assert_eq!(t.nanosecond(), 500_000_000);
    }
}
