//! Business view over assembled records: closure status, warehouse and
//! customer performance, and time-to-close in business days.
//!
//! The pipeline itself never computes these values; everything here is
//! derived from field access on finished [`CanonicalRecord`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{CanonicalRecord, Field};
use crate::parsing::detect::Detectors;
use crate::profile::schema::ProfileDef;

const DATE_FORMAT: &str = "%m/%d/%Y";
const UNKNOWN_WAREHOUSE: &str = "UNKNOWN";
const UNKNOWN_CUSTOMER: &str = "Unknown";
const CUSTOMER_NAME_CHARS: usize = 50;
const TOP_CUSTOMERS: usize = 10;

/// Closure rate (percent) below which an alert is raised.
const MIN_CLOSURE_RATE: u32 = 70;
/// Mean business days to close above which an alert is raised.
const MAX_MEAN_DAYS: u32 = 7;
/// Records taking longer than this many business days are counted as aged.
const AGED_DAYS: u32 = 15;

/// Weekdays minus US federal holidays (observed dates) over a year range.
#[derive(Debug, Clone)]
pub struct BusinessCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
    pub fn new(years: RangeInclusive<i32>) -> Self {
        let holidays = years.flat_map(federal_holidays).collect();
        BusinessCalendar { holidays }
    }

    pub fn from_profile(profile: &ProfileDef) -> Self {
        let [from, to] = profile.holiday_years;
        Self::new(from..=to)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Business days in `[start, end]`; zero when `end` precedes `start`.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_business_day(*d))
            .count() as u32
    }
}

/// Parse a report date (`M/D/YYYY`).
pub fn parse_report_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

fn federal_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = [(1, 1), (6, 19), (7, 4), (11, 11), (12, 25)];
    let floating = [
        (1, Weekday::Mon, 3),
        (2, Weekday::Mon, 3),
        (9, Weekday::Mon, 1),
        (10, Weekday::Mon, 2),
        (11, Weekday::Thu, 4),
    ];

    let mut days = Vec::new();
    for (month, day) in fixed {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            days.push(date);
            days.push(observed(date));
        }
    }
    for (month, weekday, n) in floating {
        days.extend(NaiveDate::from_weekday_of_month_opt(year, month, weekday, n));
    }
    days.extend(last_weekday_of_month(year, 5, Weekday::Mon));
    days
}

/// Saturday holidays are observed on Friday, Sunday ones on Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    Some(last - Duration::days(i64::from(back)))
}

/// Derived business attributes of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessRecord {
    pub slip_number: String,
    pub is_closed: bool,
    pub warehouse: String,
    pub customer_name: String,
    /// Only for closed records with parseable dates.
    pub business_days_to_close: Option<u32>,
}

impl BusinessRecord {
    pub fn derive(
        record: &CanonicalRecord,
        detectors: &Detectors,
        calendar: &BusinessCalendar,
    ) -> Self {
        let open = record.get(Field::Open).trim();
        let counted = record.get(Field::CountedDate).trim();
        let is_closed = (open.is_empty() || open == "0") && !counted.is_empty();

        let customer = record.get(Field::Customer).trim();
        let customer_name = if customer.is_empty() {
            UNKNOWN_CUSTOMER.to_string()
        } else {
            customer.chars().take(CUSTOMER_NAME_CHARS).collect()
        };

        let business_days_to_close = if is_closed {
            parse_report_date(record.get(Field::ReturnDate))
                .zip(parse_report_date(counted))
                .map(|(start, end)| calendar.business_days_between(start, end))
        } else {
            None
        };

        BusinessRecord {
            slip_number: detectors
                .find_slip(record.slip())
                .unwrap_or_default()
                .to_string(),
            is_closed,
            warehouse: detectors
                .extract_warehouse_code(record.get(Field::ReturnPrefix))
                .unwrap_or_else(|| UNKNOWN_WAREHOUSE.to_string()),
            customer_name,
            business_days_to_close,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseStats {
    pub warehouse: String,
    pub total: usize,
    pub closed: usize,
    pub pending: usize,
    pub closure_rate: Decimal,
    pub average_days: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerStats {
    pub customer_name: String,
    pub total: usize,
    pub closed: usize,
    pub average_days: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingTimes {
    pub count: usize,
    pub mean: Decimal,
    pub median: Decimal,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "alert")]
pub enum Alert {
    LowClosureRate { closure_rate: Decimal },
    SlowClosing { mean_days: Decimal },
    AgedRecords { count: usize },
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::LowClosureRate { closure_rate } => write!(
                f,
                "closure rate {closure_rate}% is below {MIN_CLOSURE_RATE}%"
            ),
            Alert::SlowClosing { mean_days } => write!(
                f,
                "mean time to close {mean_days} business days exceeds {MAX_MEAN_DAYS}"
            ),
            Alert::AgedRecords { count } => {
                write!(f, "{count} slips took more than {AGED_DAYS} business days")
            }
        }
    }
}

/// KPIs over a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessSummary {
    pub total: usize,
    pub closed: usize,
    pub pending: usize,
    pub closure_rate: Decimal,
    /// Known warehouses only, ordered by code.
    pub warehouses: Vec<WarehouseStats>,
    /// Busiest customers first.
    pub top_customers: Vec<CustomerStats>,
    pub closing_times: Option<ClosingTimes>,
    pub alerts: Vec<Alert>,
}

pub fn summarize(records: &[BusinessRecord]) -> BusinessSummary {
    let total = records.len();
    let closed = records.iter().filter(|r| r.is_closed).count();
    let closure_rate = percent(closed, total);

    let mut by_warehouse: BTreeMap<&str, Vec<&BusinessRecord>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.warehouse != UNKNOWN_WAREHOUSE) {
        by_warehouse.entry(r.warehouse.as_str()).or_default().push(r);
    }
    let warehouses = by_warehouse
        .into_iter()
        .map(|(warehouse, group)| {
            let closed = group.iter().filter(|r| r.is_closed).count();
            WarehouseStats {
                warehouse: warehouse.to_string(),
                total: group.len(),
                closed,
                pending: group.len() - closed,
                closure_rate: percent(closed, group.len()),
                average_days: mean(&days_of(&group)),
            }
        })
        .collect();

    let mut by_customer: BTreeMap<&str, Vec<&BusinessRecord>> = BTreeMap::new();
    for r in records {
        by_customer.entry(r.customer_name.as_str()).or_default().push(r);
    }
    let mut top_customers: Vec<CustomerStats> = by_customer
        .into_iter()
        .map(|(name, group)| CustomerStats {
            customer_name: name.to_string(),
            total: group.len(),
            closed: group.iter().filter(|r| r.is_closed).count(),
            average_days: mean(&days_of(&group)),
        })
        .collect();
    top_customers.sort_by(|a, b| b.total.cmp(&a.total));
    top_customers.truncate(TOP_CUSTOMERS);

    let all: Vec<&BusinessRecord> = records.iter().collect();
    let mut days = days_of(&all);
    days.sort_unstable();
    let closing_times = mean(&days).map(|mean| ClosingTimes {
        count: days.len(),
        mean,
        median: median(&days),
        max: days.last().copied().unwrap_or_default(),
    });

    let mut alerts = Vec::new();
    if closure_rate < Decimal::from(MIN_CLOSURE_RATE) {
        alerts.push(Alert::LowClosureRate { closure_rate });
    }
    if let Some(times) = &closing_times {
        if times.mean > Decimal::from(MAX_MEAN_DAYS) {
            alerts.push(Alert::SlowClosing {
                mean_days: times.mean,
            });
        }
        let aged = days.iter().filter(|d| **d > AGED_DAYS).count();
        if aged > 0 {
            alerts.push(Alert::AgedRecords { count: aged });
        }
    }

    BusinessSummary {
        total,
        closed,
        pending: total - closed,
        closure_rate,
        warehouses,
        top_customers,
        closing_times,
        alerts,
    }
}

fn days_of(group: &[&BusinessRecord]) -> Vec<u32> {
    group
        .iter()
        .filter(|r| r.is_closed)
        .filter_map(|r| r.business_days_to_close)
        .collect()
}

fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(1)
}

fn mean(days: &[u32]) -> Option<Decimal> {
    if days.is_empty() {
        return None;
    }
    let sum: u64 = days.iter().map(|d| u64::from(*d)).sum();
    Some((Decimal::from(sum) / Decimal::from(days.len())).round_dp(1))
}

/// Median of an ascending slice.
fn median(sorted: &[u32]) -> Decimal {
    let n = sorted.len();
    if n == 0 {
        return Decimal::ZERO;
    }
    if n % 2 == 1 {
        Decimal::from(sorted[n / 2])
    } else {
        (Decimal::from(sorted[n / 2 - 1]) + Decimal::from(sorted[n / 2])) / Decimal::TWO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::detect::tests::detectors;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        parse_report_date(s).unwrap()
    }

    fn calendar() -> BusinessCalendar {
        BusinessCalendar::new(2024..=2026)
    }

    fn business(warehouse: &str, closed: bool, days: Option<u32>) -> BusinessRecord {
        BusinessRecord {
            slip_number: "729000012345".into(),
            is_closed: closed,
            warehouse: warehouse.into(),
            customer_name: "JGR Construction".into(),
            business_days_to_close: days,
        }
    }

    #[test]
    fn test_holidays_2024() {
        let cal = calendar();
        assert!(cal.is_holiday(date("1/1/2024")));
        assert!(cal.is_holiday(date("1/15/2024")));
        assert!(cal.is_holiday(date("5/27/2024")));
        assert!(cal.is_holiday(date("11/28/2024")));
        assert!(!cal.is_holiday(date("3/5/2024")));
    }

    #[test]
    fn test_observed_dates() {
        let cal = calendar();
        // July 4th 2026 is a Saturday
        assert!(cal.is_holiday(date("7/3/2026")));
        // Christmas 2022 is outside the range
        assert!(!cal.is_holiday(date("12/26/2022")));
    }

    #[test]
    fn test_business_days_between() {
        let cal = calendar();
        // Mon 3/4 .. Fri 3/8
        assert_eq!(cal.business_days_between(date("3/4/2024"), date("3/8/2024")), 5);
        // across a weekend
        assert_eq!(cal.business_days_between(date("3/8/2024"), date("3/11/2024")), 2);
        // Thanksgiving week
        assert_eq!(
            cal.business_days_between(date("11/25/2024"), date("11/29/2024")),
            4
        );
        assert_eq!(cal.business_days_between(date("3/8/2024"), date("3/4/2024")), 0);
    }

    #[test]
    fn test_parse_report_date_accepts_unpadded() {
        assert_eq!(date("3/1/2024"), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(parse_report_date("2024-03-01").is_none());
    }

    #[test]
    fn test_derive_closed_record() {
        let d = detectors();
        let mut r = CanonicalRecord::from_cells(vec![]);
        r.set(Field::ReturnPrefix, "612d");
        r.set(Field::ReturnSlip, "729000012345");
        r.set(Field::ReturnDate, "3/4/2024");
        r.set(Field::CountedDate, "3/8/2024");
        r.set(Field::Open, "0");
        let b = BusinessRecord::derive(&r, &d, &calendar());
        assert!(b.is_closed);
        assert_eq!(b.warehouse, "612D");
        assert_eq!(b.customer_name, "Unknown");
        assert_eq!(b.business_days_to_close, Some(5));
    }

    #[test]
    fn test_derive_pending_record() {
        let d = detectors();
        let mut r = CanonicalRecord::from_cells(vec![]);
        r.set(Field::ReturnSlip, "729000012345");
        r.set(Field::Open, "105M");
        r.set(Field::CountedDate, "3/8/2024");
        r.set(Field::Customer, "x".repeat(60));
        let b = BusinessRecord::derive(&r, &d, &calendar());
        assert!(!b.is_closed);
        assert_eq!(b.warehouse, "UNKNOWN");
        assert_eq!(b.customer_name.len(), 50);
        assert_eq!(b.business_days_to_close, None);
    }

    #[test]
    fn test_summary_kpis_and_alerts() {
        let records = vec![
            business("612D", true, Some(3)),
            business("612D", true, Some(20)),
            business("612D", false, None),
            business("RO-PR", false, None),
            business("UNKNOWN", false, None),
        ];
        let s = summarize(&records);
        assert_eq!(s.total, 5);
        assert_eq!(s.closed, 2);
        assert_eq!(s.pending, 3);
        assert_eq!(s.closure_rate, dec!(40.0));
        assert_eq!(s.warehouses.len(), 2);
        assert_eq!(s.warehouses[0].warehouse, "612D");
        assert_eq!(s.warehouses[0].average_days, Some(dec!(11.5)));
        assert_eq!(s.warehouses[1].average_days, None);

        let times = s.closing_times.unwrap();
        assert_eq!(times.median, dec!(11.5));
        assert_eq!(times.max, 20);

        assert_eq!(
            s.alerts,
            vec![
                Alert::LowClosureRate {
                    closure_rate: dec!(40.0)
                },
                Alert::SlowClosing {
                    mean_days: dec!(11.5)
                },
                Alert::AgedRecords { count: 1 },
            ]
        );
    }

    #[test]
    fn test_healthy_summary_has_no_alerts() {
        let records = vec![business("612D", true, Some(2)), business("612D", true, Some(4))];
        let s = summarize(&records);
        assert_eq!(s.closure_rate, dec!(100));
        assert!(s.alerts.is_empty());
        assert_eq!(s.top_customers[0].total, 2);
    }
}
