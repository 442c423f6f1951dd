// Render options: the five per-request overrides every panel subcommand takes
use crate::domain::error::ArgumentError;
use chrono::{DateTime, Days, Duration, Months, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Grafana rendering theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// An ISO-8601 duration (`P1DT2H`, `PT30M`, `P12M`, ...), interpreted
/// relative to the request time. Year and month components use calendar
/// arithmetic, so `P1M` from March 31 lands on the last day of February.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timespan {
    text: String,
    months: u32,
    days: u64,
    secs: i64,
}

impl Timespan {
    /// The zero timespan: from/to are omitted from the render payload.
    pub fn zero() -> Self {
        Self {
            text: String::new(),
            months: 0,
            days: 0,
            secs: 0,
        }
    }

    /// Parse an ISO-8601 duration expression. The empty string is the zero
    /// timespan.
    pub fn parse(raw: &str) -> Result<Self, ArgumentError> {
        let invalid = || ArgumentError::InvalidTimespan(raw.to_string());
        if raw.is_empty() {
            return Ok(Self::zero());
        }

        let mut chars = raw.chars().peekable();
        if chars.next() != Some('P') {
            return Err(invalid());
        }

        let mut months: u32 = 0;
        let mut days: u64 = 0;
        let mut secs: i64 = 0;
        let mut in_time = false;
        let mut saw_component = false;

        while let Some(&c) = chars.peek() {
            if c == 'T' {
                if in_time {
                    return Err(invalid());
                }
                in_time = true;
                chars.next();
                continue;
            }
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let value: u64 = digits.parse().map_err(|_| invalid())?;
            let unit = chars.next().ok_or_else(invalid)?;
            let add_months = |months: u32, n: u64| -> Result<u32, ArgumentError> {
                u32::try_from(n)
                    .ok()
                    .and_then(|n| months.checked_add(n))
                    .ok_or_else(invalid)
            };
            let add_secs = |secs: i64, n: u64, scale: i64| -> Result<i64, ArgumentError> {
                i64::try_from(n)
                    .ok()
                    .and_then(|n| n.checked_mul(scale))
                    .and_then(|n| secs.checked_add(n))
                    .ok_or_else(invalid)
            };
            match (in_time, unit) {
                (false, 'Y') => {
                    let n = value.checked_mul(12).ok_or_else(invalid)?;
                    months = add_months(months, n)?;
                }
                (false, 'M') => months = add_months(months, value)?,
                (false, 'W') => {
                    let n = value.checked_mul(7).ok_or_else(invalid)?;
                    days = days.checked_add(n).ok_or_else(invalid)?;
                }
                (false, 'D') => days = days.checked_add(value).ok_or_else(invalid)?,
                (true, 'H') => secs = add_secs(secs, value, 3600)?,
                (true, 'M') => secs = add_secs(secs, value, 60)?,
                (true, 'S') => secs = add_secs(secs, value, 1)?,
                _ => return Err(invalid()),
            }
            saw_component = true;
        }

        if !saw_component {
            return Err(invalid());
        }
        // Cap every component at a millennium. Anything larger is a typo,
        // and the cap keeps `now - timespan` inside chrono's DateTime range
        // instead of overflowing at subtraction time.
        const MAX_YEARS: u64 = 1000;
        if u64::from(months) > MAX_YEARS * 12
            || days > MAX_YEARS * 366
            || secs > (MAX_YEARS * 366 * 86_400) as i64
        {
            return Err(invalid());
        }
        Ok(Self {
            text: raw.to_string(),
            months,
            days,
            secs,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.secs == 0
    }

    /// Compute `now - self` with calendar-aware month handling.
    pub fn subtract_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut from = now;
        if self.months > 0 {
            from = from.checked_sub_months(Months::new(self.months)).unwrap_or(from);
        }
        if self.days > 0 {
            from = from.checked_sub_days(Days::new(self.days)).unwrap_or(from);
        }
        from.checked_sub_signed(Duration::seconds(self.secs))
            .unwrap_or(from)
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// One of the five render-option names accepted as `key=value` overrides on
/// every panel subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Width,
    Height,
    Theme,
    Timespan,
    Timezone,
}

impl OptionField {
    pub const ALL: [Self; 5] = [
        Self::Width,
        Self::Height,
        Self::Theme,
        Self::Timespan,
        Self::Timezone,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "width" => Some(Self::Width),
            "height" => Some(Self::Height),
            "theme" => Some(Self::Theme),
            "timespan" => Some(Self::Timespan),
            "timezone" => Some(Self::Timezone),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Theme => "theme",
            Self::Timespan => "timespan",
            Self::Timezone => "timezone",
        }
    }
}

/// Per-request rendering options. Constructed fresh from the configured
/// defaults for every invocation, then overridden by user tokens; each
/// setter revalidates the combined option set and commits atomically, so a
/// partially-invalid state is never observable.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub theme: Theme,
    pub timespan: Timespan,
    pub timezone: String,
}

impl RenderOptions {
    pub fn new(
        width: u32,
        height: u32,
        theme: Theme,
        timespan: Timespan,
        timezone: String,
    ) -> Result<Self, ArgumentError> {
        let options = Self {
            width,
            height,
            theme,
            timespan,
            timezone,
        };
        options.validate()?;
        Ok(options)
    }

    /// Apply one user-supplied `key=value` override.
    pub fn set(&mut self, field: OptionField, raw: &str) -> Result<(), ArgumentError> {
        let mut candidate = self.clone();
        match field {
            OptionField::Width => {
                candidate.width = raw
                    .parse()
                    .map_err(|_| ArgumentError::InvalidWidth(raw.to_string()))?;
            }
            OptionField::Height => {
                candidate.height = raw
                    .parse()
                    .map_err(|_| ArgumentError::InvalidHeight(raw.to_string()))?;
            }
            OptionField::Theme => {
                candidate.theme = raw
                    .parse()
                    .map_err(|_| ArgumentError::InvalidTheme(raw.to_string()))?;
            }
            OptionField::Timespan => {
                candidate.timespan = Timespan::parse(raw)?;
            }
            OptionField::Timezone => {
                candidate.timezone = raw.to_string();
            }
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Default string form of a field, advertised to the chat platform as
    /// the `key=value` parameter hint.
    pub fn default_token(&self, field: OptionField) -> String {
        let value = match field {
            OptionField::Width => self.width.to_string(),
            OptionField::Height => self.height.to_string(),
            OptionField::Theme => self.theme.to_string(),
            OptionField::Timespan => self.timespan.to_string(),
            OptionField::Timezone => self.timezone.clone(),
        };
        format!("{}={}", field.key(), value)
    }

    fn validate(&self) -> Result<(), ArgumentError> {
        // IANA zone names never contain whitespace. The tz database itself
        // lives on the Grafana side, so validation stays syntactic here.
        if self.timezone.chars().any(char::is_whitespace) {
            return Err(ArgumentError::InvalidTimezone(self.timezone.clone()));
        }
        Ok(())
    }
}
