//! HL7 point-in-time values with precision tracking.
//!
//! CDA timestamps (`TS`) are written in the HL7 basic format
//! `YYYY[MM[DD[HH[MM[SS[.S+]]]]]][+/-ZZZZ]` and are routinely truncated: a
//! problem may be known to have started "in 2019" and nothing more. The
//! precision is kept alongside the value because reconciliation treats an
//! observation whose time is entirely unknown differently from one with a
//! coarse but real date.
//!
//! ISO 8601 extended dates (`YYYY-MM-DD`, `YYYY-MM-DDThh:mm:ss`) are accepted
//! as well, which keeps hand-written fixtures readable.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

/// Precision level of a timestamp, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatePrecision {
    fn from_digit_count(count: usize) -> Option<Self> {
        match count {
            4 => Some(Self::Year),
            6 => Some(Self::Month),
            8 => Some(Self::Day),
            10 => Some(Self::Hour),
            12 => Some(Self::Minute),
            14 => Some(Self::Second),
            _ => None,
        }
    }

    fn hl7_format(&self) -> &'static str {
        match self {
            Self::Year => "%Y",
            Self::Month => "%Y%m",
            Self::Day => "%Y%m%d",
            Self::Hour => "%Y%m%d%H",
            Self::Minute => "%Y%m%d%H%M",
            Self::Second => "%Y%m%d%H%M%S",
        }
    }
}

/// A parsed timestamp: the earliest instant it denotes plus its precision.
///
/// Ordering compares the instant first, so `2019` sorts before `20190301`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    value: NaiveDateTime,
    precision: DatePrecision,
}

impl Timestamp {
    pub fn new(value: NaiveDateTime, precision: DatePrecision) -> Self {
        Self { value, precision }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            value: date.and_time(chrono::NaiveTime::MIN),
            precision: DatePrecision::Day,
        }
    }

    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    pub fn date(&self) -> NaiveDate {
        self.value.date()
    }

    pub fn precision(&self) -> DatePrecision {
        self.precision
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.format(self.precision.hl7_format()))
    }
}

impl FromStr for Timestamp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(invalid(s, "empty value"));
        }
        if text.len() > 4 && text.as_bytes()[4] == b'-' {
            parse_iso(s, text)
        } else {
            parse_hl7(s, text)
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn invalid(value: &str, reason: &str) -> ModelError {
    ModelError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_hl7(original: &str, text: &str) -> Result<Timestamp, ModelError> {
    // Timezone offsets are dropped: documents are imported in local time.
    let without_zone = match text.find(['+', '-']) {
        Some(index) => &text[..index],
        None => text,
    };
    let digits = without_zone
        .split_once('.')
        .map_or(without_zone, |(whole, _fraction)| whole);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(original, "expected digits"));
    }
    let precision = DatePrecision::from_digit_count(digits.len())
        .ok_or_else(|| invalid(original, "unsupported length"))?;

    let field = |start: usize, default: u32| -> u32 {
        digits
            .get(start..start + 2)
            .and_then(|part| part.parse().ok())
            .unwrap_or(default)
    };
    let year: i32 = digits[..4]
        .parse()
        .map_err(|_| invalid(original, "bad year"))?;
    build(
        original,
        year,
        [field(4, 1), field(6, 1), field(8, 0), field(10, 0), field(12, 0)],
        precision,
    )
}

fn parse_iso(original: &str, text: &str) -> Result<Timestamp, ModelError> {
    let (date_part, time_part) = match text.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (text, None),
    };

    let date_fields: Vec<&str> = date_part.split('-').collect();
    if date_fields.is_empty() || date_fields.len() > 3 {
        return Err(invalid(original, "bad date"));
    }
    let number = |part: &str| -> Result<u32, ModelError> {
        part.parse().map_err(|_| invalid(original, "expected digits"))
    };
    let year: i32 = date_fields[0]
        .parse()
        .map_err(|_| invalid(original, "bad year"))?;
    let month = date_fields.get(1).map(|p| number(p)).transpose()?;
    let day = date_fields.get(2).map(|p| number(p)).transpose()?;

    let mut precision = match (month, day) {
        (None, _) => DatePrecision::Year,
        (Some(_), None) => DatePrecision::Month,
        (Some(_), Some(_)) => DatePrecision::Day,
    };
    let mut time = [0u32; 3];
    if let Some(time_part) = time_part {
        if precision != DatePrecision::Day {
            return Err(invalid(original, "time without a full date"));
        }
        let clock = time_part
            .trim_end_matches('Z')
            .split(['+', '-'])
            .next()
            .unwrap_or_default();
        let clock = clock.split_once('.').map_or(clock, |(whole, _)| whole);
        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid(original, "bad time"));
        }
        for (slot, part) in time.iter_mut().zip(&parts) {
            *slot = number(part)?;
        }
        precision = match parts.len() {
            1 => DatePrecision::Hour,
            2 => DatePrecision::Minute,
            _ => DatePrecision::Second,
        };
    }

    build(
        original,
        year,
        [month.unwrap_or(1), day.unwrap_or(1), time[0], time[1], time[2]],
        precision,
    )
}

fn build(
    original: &str,
    year: i32,
    [month, day, hour, minute, second]: [u32; 5],
    precision: DatePrecision,
) -> Result<Timestamp, ModelError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|value| Timestamp::new(value, precision))
        .ok_or_else(|| invalid(original, "out of range"))
}
