//! Request number format: `<PREFIX>-<YYYYMMDD>-<seq>`, seq zero-padded to
//! three digits and allowed to grow past 999.

use chrono::NaiveDate;

/// Date part of a request number and of the per-day counter key.
pub const DAY_FORMAT: &str = "%Y%m%d";

pub fn day_stamp(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

pub fn format_request_no(prefix: &str, date: NaiveDate, seq: u64) -> String {
    format!("{}-{}-{:03}", prefix, day_stamp(date), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nov25() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 25).unwrap()
    }

    #[test]
    fn formats_with_padding() {
        assert_eq!(format_request_no("REQ", nov25(), 1), "REQ-20241125-001");
        assert_eq!(format_request_no("REQ", nov25(), 42), "REQ-20241125-042");
        assert_eq!(format_request_no("REQ", nov25(), 1234), "REQ-20241125-1234");
    }
}
