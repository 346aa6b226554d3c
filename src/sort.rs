use crate::record::StudentRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "STUDENTS_NAME")]
    Name,
    #[serde(rename = "ADMISSION_DATE")]
    AdmissionDate,
    #[serde(rename = "ADMISSION_NO")]
    AdmissionNo,
    #[serde(rename = "DOB")]
    Dob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// `None` key means the default ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

/// Leading-integer parse: optional sign and digits after leading
/// whitespace, anything after is ignored ("12b" is 12, "3.7" is 3).
pub fn parse_int_prefix(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Case-insensitive first, then exact, so "abc" < "ABD" < "abe".
pub fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn opt_text_cmp(a: Option<&str>, b: Option<&str>) -> Ordering {
    text_cmp(a.unwrap_or_default(), b.unwrap_or_default())
}

/// Present values first; absent values compare equal among themselves.
fn present_first<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Display order, then numeric roll, then roll text.
pub fn default_cmp(a: &StudentRecord, b: &StudentRecord) -> Ordering {
    let da = parse_int_prefix(a.display_order.as_deref());
    let db = parse_int_prefix(b.display_order.as_deref());
    present_first(da, db, SortDirection::Asc)
        .then_with(|| {
            let ra = parse_int_prefix(a.roll.as_deref());
            let rb = parse_int_prefix(b.roll.as_deref());
            present_first(ra, rb, SortDirection::Asc)
        })
        .then_with(|| opt_text_cmp(a.roll.as_deref(), b.roll.as_deref()))
}

pub fn parse_date(raw: Option<&str>) -> Option<NaiveDateTime> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    // "Mon, 05 Jan 2015": drop the weekday name and read the rest.
    let dated = match s.split_once(", ") {
        Some((day, rest)) if day.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => s,
    };
    for fmt in ["%d %b %Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(dated, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Keyed comparison with the direction applied. Unparseable dates sit
/// after every valid date in both directions.
fn keyed_cmp(key: SortKey, direction: SortDirection, a: &StudentRecord, b: &StudentRecord) -> Ordering {
    match key {
        SortKey::Name => direction.apply(opt_text_cmp(a.name.as_deref(), b.name.as_deref())),
        SortKey::AdmissionNo => direction.apply(opt_text_cmp(
            a.admission_no.as_deref(),
            b.admission_no.as_deref(),
        )),
        // Most recent admission first when ascending.
        SortKey::AdmissionDate => present_first(
            parse_date(a.admission_date.as_deref()).map(std::cmp::Reverse),
            parse_date(b.admission_date.as_deref()).map(std::cmp::Reverse),
            direction,
        ),
        SortKey::Dob => present_first(
            parse_date(a.dob.as_deref()),
            parse_date(b.dob.as_deref()),
            direction,
        ),
    }
}

pub fn compare(spec: SortSpec, a: &StudentRecord, b: &StudentRecord) -> Ordering {
    match spec.key {
        None => default_cmp(a, b),
        Some(key) => keyed_cmp(key, spec.direction, a, b).then_with(|| default_cmp(a, b)),
    }
}

/// Stable in-place sort of borrowed rows.
pub fn sort_records(records: &mut [&StudentRecord], spec: SortSpec) {
    records.sort_by(|a, b| compare(spec, a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::student;
    use serde_json::json;

    fn rolls(list: &[&StudentRecord]) -> Vec<String> {
        list.iter()
            .map(|s| s.roll.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn parse_int_prefix_reads_leading_digits() {
        assert_eq!(parse_int_prefix(Some("12")), Some(12));
        assert_eq!(parse_int_prefix(Some(" 7b")), Some(7));
        assert_eq!(parse_int_prefix(Some("3.9")), Some(3));
        assert_eq!(parse_int_prefix(Some("-4")), Some(-4));
        assert_eq!(parse_int_prefix(Some("b7")), None);
        assert_eq!(parse_int_prefix(Some("")), None);
        assert_eq!(parse_int_prefix(None), None);
    }

    #[test]
    fn default_order_uses_numeric_roll_without_display_order() {
        let a = student(json!({ "ROLL": "5", "display_order": null }));
        let b = student(json!({ "ROLL": "2", "display_order": null }));
        let mut list = vec![&a, &b];
        sort_records(&mut list, SortSpec::default());
        assert_eq!(rolls(&list), vec!["2", "5"]);
    }

    #[test]
    fn display_order_outranks_roll() {
        let a = student(json!({ "ROLL": 1, "display_order": 2 }));
        let b = student(json!({ "ROLL": 9, "display_order": 1 }));
        let c = student(json!({ "ROLL": 3, "display_order": 1 }));
        let mut list = vec![&a, &b, &c];
        sort_records(&mut list, SortSpec::default());
        assert_eq!(rolls(&list), vec!["3", "9", "1"]);
    }

    #[test]
    fn rows_with_display_order_precede_rows_without() {
        let ordered = student(json!({ "ROLL": 9, "display_order": 1 }));
        let unordered = student(json!({ "ROLL": 2 }));
        let blank = student(json!({ "ROLL": 1, "display_order": "" }));
        let mut list = vec![&unordered, &blank, &ordered];
        sort_records(&mut list, SortSpec::default());
        assert_eq!(rolls(&list), vec!["9", "1", "2"]);
        assert_eq!(default_cmp(&ordered, &unordered), Ordering::Less);
        assert_eq!(default_cmp(&unordered, &ordered), Ordering::Greater);
    }

    #[test]
    fn non_numeric_rolls_fall_back_to_text() {
        let a = student(json!({ "ROLL": "b" }));
        let b = student(json!({ "ROLL": "A" }));
        let c = student(json!({ "ROLL": "4" }));
        let d = student(json!({}));
        let mut list = vec![&a, &b, &d, &c];
        sort_records(&mut list, SortSpec::default());
        assert_eq!(rolls(&list), vec!["4", "", "A", "b"]);
    }

    #[test]
    fn name_sort_flips_with_direction_but_tie_break_does_not() {
        let a = student(json!({ "STUDENTS_NAME": "Meera", "ROLL": 2 }));
        let b = student(json!({ "STUDENTS_NAME": "aarav", "ROLL": 7 }));
        let c = student(json!({ "STUDENTS_NAME": "Meera", "ROLL": 1 }));

        let mut asc = vec![&a, &b, &c];
        sort_records(
            &mut asc,
            SortSpec {
                key: Some(SortKey::Name),
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(rolls(&asc), vec!["7", "1", "2"]);

        let mut desc = vec![&a, &b, &c];
        sort_records(
            &mut desc,
            SortSpec {
                key: Some(SortKey::Name),
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(rolls(&desc), vec!["1", "2", "7"]);
    }

    #[test]
    fn admission_date_sorts_most_recent_first() {
        let old = student(json!({ "ROLL": 1, "ADMISSION_DATE": "Mon, 01 Apr 2019 00:00:00 GMT" }));
        let new = student(json!({ "ROLL": 2, "ADMISSION_DATE": "2024-04-01" }));
        let mid = student(json!({ "ROLL": 3, "ADMISSION_DATE": "15-06-2021" }));
        let bad = student(json!({ "ROLL": 4, "ADMISSION_DATE": "not a date" }));
        let spec = SortSpec {
            key: Some(SortKey::AdmissionDate),
            direction: SortDirection::Asc,
        };
        let mut list = vec![&old, &bad, &new, &mid];
        sort_records(&mut list, spec);
        assert_eq!(rolls(&list), vec!["2", "3", "1", "4"]);

        let mut reversed = vec![&old, &bad, &new, &mid];
        sort_records(
            &mut reversed,
            SortSpec {
                direction: SortDirection::Desc,
                ..spec
            },
        );
        assert_eq!(rolls(&reversed), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn dob_sorts_chronologically() {
        let a = student(json!({ "ROLL": 1, "DOB": "Sat, 14 Mar 2015" }));
        let b = student(json!({ "ROLL": 2, "DOB": "Wed, 02 Jan 2013" }));
        let c = student(json!({ "ROLL": 3 }));
        let mut list = vec![&c, &a, &b];
        sort_records(
            &mut list,
            SortSpec {
                key: Some(SortKey::Dob),
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(rolls(&list), vec!["2", "1", "3"]);
    }

    #[test]
    fn parse_date_accepts_backend_formats() {
        let expected = NaiveDate::from_ymd_opt(2015, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        assert_eq!(parse_date(Some("Mon, 05 Jan 2015")), expected);
        assert_eq!(parse_date(Some("05 Jan 2015")), expected);
        assert_eq!(parse_date(Some("2015-01-05")), expected);
        assert_eq!(parse_date(Some("05-01-2015")), expected);
        assert_eq!(parse_date(Some("05/01/2015")), expected);
        assert_eq!(parse_date(Some("Mon, 05 Jan 2015 00:00:00 GMT")), expected);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("32-13-2015")), None);
    }

    #[test]
    fn sorting_mixed_rows_is_deterministic() {
        let rows = vec![
            student(json!({ "ROLL": "x", "display_order": "2" })),
            student(json!({ "ROLL": 3 })),
            student(json!({ "display_order": 1 })),
            student(json!({ "ROLL": "10", "display_order": "n/a" })),
            student(json!({ "ROLL": 3, "ADMISSION_NO": "b" })),
            student(json!({})),
        ];
        for key in [
            None,
            Some(SortKey::Name),
            Some(SortKey::AdmissionDate),
            Some(SortKey::AdmissionNo),
            Some(SortKey::Dob),
        ] {
            let spec = SortSpec {
                key,
                direction: SortDirection::Desc,
            };
            let mut first: Vec<&StudentRecord> = rows.iter().collect();
            sort_records(&mut first, spec);
            let mut again = first.clone();
            sort_records(&mut again, spec);
            assert_eq!(first, again);
            assert_eq!(first.len(), rows.len());
        }
    }
}
