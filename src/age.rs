//! Calendar-date arithmetic for ages.
//!
//! Dates are timezone-naive: a `YYYY-MM-DD` string always means that calendar
//! day, regardless of where the process runs.

use chrono::{Datelike, NaiveDate};

/// Parses an upstream date string.
///
/// Accepts `YYYY-MM-DD`, optionally followed by an ISO time part which is
/// ignored. Empty strings and invalid calendar days yield `None`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let day = match trimmed.split_once('T') {
        Some((day, _)) => day,
        None => trimmed,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Whole years elapsed from `birth` to `target`.
///
/// Month/day pairs are compared directly, so a Feb 29 birthday is reached on
/// Mar 1 in non-leap years. The result is negative when `target` precedes
/// `birth`.
pub fn age_on(birth: NaiveDate, target: NaiveDate) -> i32 {
    let mut age = target.year() - birth.year();
    if (target.month(), target.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// String-level age computation. Never fails: missing or unparseable input
/// gives `None`.
pub fn compute_age(birth: Option<&str>, target: Option<&str>) -> Option<i32> {
    let birth = parse_date(birth?)?;
    let target = parse_date(target?)?;
    Some(age_on(birth, target))
}

/// Age at `target`, treating a target before birth as unknown.
pub(crate) fn known_age(birth: Option<NaiveDate>, target: Option<NaiveDate>) -> Option<i32> {
    let age = age_on(birth?, target?);
    (age >= 0).then_some(age)
}

/// Calendar years since release, counted by year number only.
pub fn years_since_release(release: Option<NaiveDate>, today: NaiveDate) -> Option<i32> {
    release.map(|r| today.year() - r.year())
}

pub fn display_age(age: Option<i32>) -> String {
    match age {
        Some(a) => a.to_string(),
        None => "N/A".to_string(),
    }
}
