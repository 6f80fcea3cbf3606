// Utility helpers for parsing, calendar ordering and counting.
//
// The loader and the pipelines both lean on this module so that date, time
// and number handling lives in one place.
use chrono::{NaiveDate, NaiveTime, Timelike};
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::hash::Hash;

/// Fallback label for a missing categorical value.
pub const UNSPECIFIED: &str = "Unspecified";

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// Month name -> calendar rank. Grouping keys are month names, so ordering
// must go through this table rather than the text itself.
static MONTH_RANK: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(rank, name)| (*name, rank))
        .collect()
});

/// English name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}

/// Calendar rank of a month name; unknown names sort last.
pub fn month_rank(name: &str) -> usize {
    MONTH_RANK.get(name).copied().unwrap_or(MONTH_NAMES.len())
}

/// Parse a `day/month/year` date, e.g. `31/12/2021`.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// Hour of day from an `HH:MM` time. Anything else, including out-of-range
/// values like `99:99`, yields `None`.
pub fn parse_hour(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok().map(|t| t.hour())
}

/// Parse a non-negative count. Blank or malformed cells count as zero, and
/// float-formatted integers such as `2.0` are accepted.
pub fn parse_count(s: Option<&str>) -> u64 {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return v;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

/// Trimmed text, or `None` when blank.
pub fn clean_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Sums per key while remembering the order keys were first seen in, so a
/// stable descending sort breaks ties by first appearance.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Tally {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: K, amount: u64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, amount));
            }
        }
    }

    /// Entries by descending total, ties in first-seen order, keeping at most
    /// `limit` of them.
    pub fn top(self, limit: Option<usize>) -> Vec<(K, u64)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators, e.g. `1,234.50`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_rank_follows_calendar_not_alphabet() {
        assert!(month_rank("January") < month_rank("February"));
        assert!(month_rank("March") < month_rank("April"));
        assert!(month_rank("November") < month_rank("December"));
        assert_eq!(month_rank("Smarch"), 12);
    }

    #[test]
    fn parses_day_month_year_dates() {
        assert_eq!(
            parse_date_safe(Some(" 31/12/2021 ")),
            NaiveDate::from_ymd_opt(2021, 12, 31)
        );
        assert_eq!(parse_date_safe(Some("2021-12-31")), None);
        assert_eq!(parse_date_safe(Some("31/02/2021")), None);
        assert_eq!(parse_date_safe(Some("")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn parses_hour_of_day() {
        assert_eq!(parse_hour(Some("00:15")), Some(0));
        assert_eq!(parse_hour(Some("23:59")), Some(23));
        assert_eq!(parse_hour(Some("99:99")), None);
        assert_eq!(parse_hour(Some("24:00")), None);
        assert_eq!(parse_hour(Some("noon")), None);
        assert_eq!(parse_hour(None), None);
    }

    #[test]
    fn parses_counts_leniently() {
        assert_eq!(parse_count(Some("3")), 3);
        assert_eq!(parse_count(Some("2.0")), 2);
        assert_eq!(parse_count(Some("1,204")), 1204);
        assert_eq!(parse_count(Some("-1")), 0);
        assert_eq!(parse_count(Some("n/a")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn tally_breaks_ties_by_first_seen() {
        let mut tally = Tally::new();
        for key in ["b", "a", "c", "a", "d"] {
            tally.add(key, 1);
        }
        let top = tally.top(Some(3));
        assert_eq!(top, vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(0.001, 3), "0.001");
        assert_eq!(format_number(-42.0, 0), "-42");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
