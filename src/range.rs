use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Start and end date are required")]
    MissingDates,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("End date must be after start date")]
    EndBeforeStart,
    #[error("Date range cannot exceed {max_days} days")]
    TooLong { max_days: u32 },
}

/// Timezone and maximum span every user supplied range is checked against.
#[derive(Debug, Clone, Copy)]
pub struct RangePolicy {
    pub timezone: Tz,
    pub max_days: u32,
}

/// Half-open `[start, end)` interval anchored to the policy timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeRange {
    /// Parses two calendar dates into a range whose end covers the whole end date.
    pub fn validate(start: &str, end: &str, policy: &RangePolicy) -> Result<Self, RangeError> {
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(RangeError::MissingDates);
        }

        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?
            .succ_opt()
            .ok_or_else(|| RangeError::InvalidDate(end.to_string()))?;

        let start_at = local_midnight(start_date, policy.timezone)?;
        let end_at = local_midnight(end_date, policy.timezone)?;

        if end_at <= start_at {
            return Err(RangeError::EndBeforeStart);
        }

        // Counted in calendar days so DST transitions inside the range don't shift the limit
        if (end_date - start_date).num_days() > i64::from(policy.max_days) {
            return Err(RangeError::TooLong {
                max_days: policy.max_days,
            });
        }

        Ok(Self {
            start: start_at,
            end: end_at,
        })
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RangeError::InvalidDate(value.to_string()))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, RangeError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RangeError::InvalidDate(date.to_string()))?;

    tz.from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(|| RangeError::InvalidDate(date.to_string()))
}
