//! Retention date grammar.
//!
//! A retention specification is either a relative duration (`7d`, `2m`,
//! `1y` — months and years approximated as 30- and 365-day units) or an
//! absolute `YYYY-MM-DD` calendar date taken at midnight UTC. The resolved
//! deadline is truncated to whole seconds and rendered RFC 3339 with an
//! explicit `Z` marker.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc};

use crate::error::RetentionError;

/// Days per month used when resolving `Nm` specifications.
const DAYS_PER_MONTH: i64 = 30;
/// Days per year used when resolving `Ny` specifications.
const DAYS_PER_YEAR: i64 = 365;

/// Parsed retention specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionSpec {
    /// Whole days added to the lock instant.
    Days(u32),
    /// 30-day units added to the lock instant.
    Months(u32),
    /// 365-day units added to the lock instant.
    Years(u32),
    /// Fixed calendar date at 00:00:00 UTC.
    Date(NaiveDate),
}

impl RetentionSpec {
    /// Parse a specification string.
    ///
    /// # Errors
    ///
    /// Returns [`RetentionError`] when the magnitude before a duration
    /// suffix is not an integer or the string matches no grammar rule.
    pub fn parse(input: &str) -> Result<Self, RetentionError> {
        let trimmed = input.trim();
        if let Some(magnitude) = trimmed.strip_suffix('d') {
            return parse_magnitude(magnitude, trimmed).map(Self::Days);
        }
        if let Some(magnitude) = trimmed.strip_suffix('m') {
            return parse_magnitude(magnitude, trimmed).map(Self::Months);
        }
        if let Some(magnitude) = trimmed.strip_suffix('y') {
            return parse_magnitude(magnitude, trimmed).map(Self::Years);
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|_| RetentionError::UnrecognisedSpec {
                value: trimmed.to_owned(),
            })
    }

    /// Resolve the specification into an absolute deadline relative to
    /// `now`, truncated to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RetentionError::OutOfRange`] when the deadline falls
    /// outside the representable time range; any magnitude parses, so a
    /// configured spec like `100000000d` lands here instead of panicking.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, RetentionError> {
        let deadline = match *self {
            Self::Days(days) => add_days(now, i64::from(days)),
            Self::Months(months) => add_days(now, DAYS_PER_MONTH * i64::from(months)),
            Self::Years(years) => add_days(now, DAYS_PER_YEAR * i64::from(years)),
            Self::Date(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
        };
        deadline
            .map(|deadline| deadline.trunc_subsecs(0))
            .ok_or_else(|| RetentionError::OutOfRange {
                value: self.to_string(),
            })
    }
}

impl fmt::Display for RetentionSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Days(days) => write!(formatter, "{days}d"),
            Self::Months(months) => write!(formatter, "{months}m"),
            Self::Years(years) => write!(formatter, "{years}y"),
            Self::Date(date) => write!(formatter, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Render a resolved deadline in the wire form the lock RPC expects.
#[must_use]
pub fn format_retention(deadline: DateTime<Utc>) -> String {
    deadline.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `Duration::days` panics outside its own range, so both the delta and
/// the addition are checked.
fn add_days(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|delta| now.checked_add_signed(delta))
}

fn parse_magnitude(magnitude: &str, raw: &str) -> Result<u32, RetentionError> {
    magnitude
        .parse::<u32>()
        .map_err(|_| RetentionError::InvalidMagnitude {
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid instant")
    }

    #[test]
    fn relative_specs_add_approximate_units() -> Result<()> {
        let now = reference_now();
        assert_eq!(
            format_retention(RetentionSpec::parse("7d")?.resolve(now)?),
            "2024-01-08T00:00:00Z"
        );
        assert_eq!(
            format_retention(RetentionSpec::parse("2m")?.resolve(now)?),
            "2024-03-01T00:00:00Z"
        );
        assert_eq!(
            format_retention(RetentionSpec::parse("1y")?.resolve(now)?),
            "2024-12-31T00:00:00Z"
        );
        Ok(())
    }

    #[test]
    fn calendar_date_resolves_to_midnight_utc() -> Result<()> {
        let resolved = RetentionSpec::parse("2023-12-31")?.resolve(reference_now())?;
        assert_eq!(format_retention(resolved), "2023-12-31T00:00:00Z");
        Ok(())
    }

    #[test]
    fn subsecond_precision_is_truncated() -> Result<()> {
        let now = reference_now() + Duration::milliseconds(250);
        let resolved = RetentionSpec::parse("1d")?.resolve(now)?;
        assert_eq!(resolved.timestamp_subsec_nanos(), 0);
        assert_eq!(format_retention(resolved), "2024-01-02T00:00:00Z");
        Ok(())
    }

    #[test]
    fn unrepresentable_deadlines_are_rejected_without_panicking() -> Result<()> {
        let now = reference_now();
        assert_eq!(
            RetentionSpec::parse("100000000d")?.resolve(now),
            Err(RetentionError::OutOfRange {
                value: "100000000d".into(),
            })
        );
        assert_eq!(
            RetentionSpec::parse("4294967295y")?.resolve(now),
            Err(RetentionError::OutOfRange {
                value: "4294967295y".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn malformed_specs_are_rejected() {
        assert!(matches!(
            RetentionSpec::parse("bogus"),
            Err(RetentionError::UnrecognisedSpec { .. })
        ));
        assert!(matches!(
            RetentionSpec::parse("xd"),
            Err(RetentionError::InvalidMagnitude { .. })
        ));
        assert!(matches!(
            RetentionSpec::parse("-3d"),
            Err(RetentionError::InvalidMagnitude { .. })
        ));
        assert!(matches!(
            RetentionSpec::parse("2024-13-40"),
            Err(RetentionError::UnrecognisedSpec { .. })
        ));
        assert!(matches!(
            RetentionSpec::parse(""),
            Err(RetentionError::UnrecognisedSpec { .. })
        ));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() -> Result<()> {
        assert_eq!(RetentionSpec::parse(" 7d ")?, RetentionSpec::Days(7));
        Ok(())
    }
}
