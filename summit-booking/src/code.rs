use chrono::NaiveDate;
use uuid::Uuid;

/// Generates a booking code: `{prefix}-{YYYYMMDD}-{XXXX}`.
///
/// The suffix is four upper-case hex characters from a fresh v4 UUID, so two
/// codes generated on the same day may collide; the storage layer rejects the
/// duplicate and the caller draws again.
pub fn generate_booking_code(prefix: &str, today: NaiveDate) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("{}-{}-{}", prefix, today.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let code = generate_booking_code("RNJ", today);

        assert_eq!(code.len(), "RNJ-20261016-XXXX".len());
        assert!(code.starts_with("RNJ-20261016-"));
        let suffix = &code[13..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}
