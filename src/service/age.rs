use chrono::NaiveDate;

/// Birthdates are stored as `MM/dd/yyyy`.
pub const BIRTHDATE_FORMAT: &str = "%m/%d/%Y";

/// Oldest age still counted as a child.
pub const CHILD_MAX_AGE: u32 = 18;

pub fn parse_birthdate(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BIRTHDATE_FORMAT).ok()
}

/// Whole years between `birthdate` and `today`; `None` for a birthdate in the future.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birthdate)
}

pub fn age_from_birthdate(raw: &str, today: NaiveDate) -> Option<u32> {
    parse_birthdate(raw).and_then(|birthdate| age_on(birthdate, today))
}

pub fn is_child(age: Option<u32>) -> bool {
    matches!(age, Some(age) if age <= CHILD_MAX_AGE)
}
