// Calendar primitives shared by aggregation, forecasting and export
use super::error::TelemetryError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar year and month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar month immediately after this one.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Midnight on the first day of the month.
    pub fn start(&self) -> NaiveDateTime {
        self.first_day().and_time(NaiveTime::MIN)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TelemetryError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TelemetryError> {
        if start > end {
            return Err(TelemetryError::invalid_range(start, end));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Half-open `[start, end)` timestamp window covering every day in the range.
    /// `NaiveDate::MIN` and `NaiveDate::MAX` leave that side open.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: (self.start != NaiveDate::MIN).then(|| self.start.and_time(NaiveTime::MIN)),
            end: self
                .end
                .succ_opt()
                .map(|next| next.and_time(NaiveTime::MIN)),
        }
    }
}

/// Optional half-open timestamp bounds handed to the Reading Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts < end)
    }
}

/// Table/stat filters offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
    Month(YearMonth),
}

impl TimeFilter {
    /// Builds a filter from the `filter` and `month` query parameters.
    /// An explicit month wins over a relative filter.
    pub fn from_params(filter: Option<&str>, month: Option<&str>) -> Result<Self, TelemetryError> {
        if let Some(month) = month.filter(|m| !m.trim().is_empty()) {
            return Ok(Self::Month(month.parse()?));
        }
        Ok(match filter.map(str::trim) {
            Some("day") => Self::Today,
            Some("week") => Self::ThisWeek,
            Some("month") => Self::ThisMonth,
            _ => Self::All,
        })
    }

    pub fn window(&self, now: NaiveDateTime) -> TimeWindow {
        let today = now.date();
        match self {
            Self::All => TimeWindow::unbounded(),
            Self::Today => TimeWindow {
                start: Some(today.and_time(NaiveTime::MIN)),
                end: None,
            },
            Self::ThisWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                TimeWindow {
                    start: Some(monday.and_time(NaiveTime::MIN)),
                    end: None,
                }
            }
            Self::ThisMonth => TimeWindow {
                start: Some(YearMonth::of(today).start()),
                end: None,
            },
            Self::Month(month) => TimeWindow {
                start: Some(month.start()),
                end: Some(month.succ().start()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2025, 3).unwrap());
        assert_eq!(ym.to_string(), "2025-03");

        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("March".parse::<YearMonth>().is_err());
        assert!(matches!(
            "2025/03".parse::<YearMonth>(),
            Err(TelemetryError::InvalidMonth(_))
        ));
    }

    #[test]
    fn test_year_month_succ_wraps_year() {
        let dec = YearMonth::new(2024, 12).unwrap();
        assert_eq!(dec.succ(), YearMonth::new(2025, 1).unwrap());
        assert_eq!(dec.succ().start(), at(2025, 1, 1, 0));
        assert!(dec < dec.succ());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert!(matches!(
            DateRange::new(a, b),
            Err(TelemetryError::InvalidRange { .. })
        ));

        let single = DateRange::new(a, a).unwrap();
        let window = single.window();
        assert!(window.contains(at(2025, 1, 10, 23)));
        assert!(!window.contains(at(2025, 1, 11, 0)));
    }

    #[test]
    fn test_time_filter_windows() {
        // Wednesday
        let now = at(2025, 3, 12, 15);

        let week = TimeFilter::ThisWeek.window(now);
        assert_eq!(week.start, Some(at(2025, 3, 10, 0)));
        assert_eq!(week.end, None);

        let month = TimeFilter::ThisMonth.window(now);
        assert_eq!(month.start, Some(at(2025, 3, 1, 0)));

        let explicit = TimeFilter::from_params(Some("day"), Some("2024-12")).unwrap();
        let window = explicit.window(now);
        assert_eq!(window.start, Some(at(2024, 12, 1, 0)));
        assert_eq!(window.end, Some(at(2025, 1, 1, 0)));

        assert_eq!(TimeFilter::from_params(Some("bogus"), None).unwrap(), TimeFilter::All);
        assert_eq!(TimeFilter::All.window(now), TimeWindow::unbounded());
    }
}
