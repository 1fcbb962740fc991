use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use summit_shared::forms::{parse_date, FieldErrors};

use crate::checkin::{CheckIn, CheckInStatus};
use crate::models::{Booking, BookingError, BookingStatus};

/// A booking joined with what the listings show beside it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingListing {
    #[serde(flatten)]
    pub booking: Booking,
    pub total_price: i64,
    pub route_name: String,
    pub route_slug: String,
    pub mountain_name: String,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
}

impl BookingListing {
    pub fn new(
        booking: Booking,
        route_name: String,
        route_slug: String,
        mountain_name: String,
        customer_email: String,
        customer_first_name: String,
        customer_last_name: String,
    ) -> Self {
        Self {
            total_price: booking.total_price(),
            booking,
            route_name,
            route_slug,
            mountain_name,
            customer_email,
            customer_first_name,
            customer_last_name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    /// Matches booking code, customer email or name, case-insensitively.
    pub search: Option<String>,
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
}

impl BookingFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Trimmed, lower-cased search text; `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        search_term(&self.search)
    }

    pub fn matches(&self, listing: &BookingListing) -> bool {
        let b = &listing.booking;
        if self.user_id.is_some_and(|id| id != b.user_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != b.status) {
            return false;
        }
        if self.start_from.is_some_and(|d| b.start_date < d) {
            return false;
        }
        if self.start_to.is_some_and(|d| b.start_date > d) {
            return false;
        }
        match self.search_term() {
            Some(term) => [
                b.booking_code.as_str(),
                listing.customer_email.as_str(),
                listing.customer_first_name.as_str(),
                listing.customer_last_name.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }
}

/// A `status` query value. Blank and `all` mean no status filter.
pub fn status_param(value: Option<&str>) -> Result<Option<BookingStatus>, BookingError> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(other) => other.parse().map(Some),
    }
}

/// Booking list query as it arrives in the URL. Every field is optional
/// and blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "date_from")]
    pub start_from: Option<String>,
    #[serde(alias = "date_to")]
    pub start_to: Option<String>,
}

impl BookingQuery {
    pub fn into_filter(self) -> Result<BookingFilter, FieldErrors> {
        let mut errors = FieldErrors::new();
        let status = status_param(self.status.as_deref()).unwrap_or_else(|e| {
            errors.add("status", e.to_string());
            None
        });
        let mut date = |field: &str, value: Option<&str>| match value.map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    errors.add(field, "Format tanggal tidak valid.");
                }
                parsed
            }
        };
        let start_from = date("start_from", self.start_from.as_deref());
        let start_to = date("start_to", self.start_to.as_deref());
        errors.into_result()?;

        Ok(BookingFilter {
            user_id: None,
            status,
            search: self.search,
            start_from,
            start_to,
        })
    }
}

/// A check-in joined with its participant and booking.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInListing {
    #[serde(flatten)]
    pub checkin: CheckIn,
    pub participant_name: String,
    pub participant_id_number: String,
    pub booking_code: String,
    pub booking_start_date: NaiveDate,
    pub mountain_name: String,
    pub customer_email: String,
}

#[derive(Debug, Clone, Default)]
pub struct CheckInFilter {
    pub status: Option<CheckInStatus>,
    /// Matches participant name, id number, booking code or payload.
    pub search: Option<String>,
    pub booking_id: Option<Uuid>,
}

impl CheckInFilter {
    pub fn search_term(&self) -> Option<String> {
        search_term(&self.search)
    }

    pub fn matches(&self, listing: &CheckInListing) -> bool {
        let c = &listing.checkin;
        if self.status.is_some_and(|s| s != c.status) {
            return false;
        }
        if self.booking_id.is_some_and(|id| id != c.booking_id) {
            return false;
        }
        match self.search_term() {
            Some(term) => [
                listing.participant_name.as_str(),
                listing.participant_id_number.as_str(),
                listing.booking_code.as_str(),
                c.qr_data.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }
}

fn search_term(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use summit_catalog::Route;

    fn listing(code: &str, email: &str, start: NaiveDate) -> BookingListing {
        let route = Route::new(Uuid::new_v4(), "Jalur Senaru", "", "Desa Senaru", 3, 2, 22.5, 1_800_000);
        let booking = Booking::new(code.into(), Uuid::new_v4(), &route, start, 2, String::new());
        BookingListing::new(
            booking,
            route.name.clone(),
            route.slug.clone(),
            "Gunung Rinjani".into(),
            email.into(),
            "Sari".into(),
            "Dewi".into(),
        )
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let l = listing("RNJ-20261016-AB12", "sari@example.com", date(1));
        let by = |s: &str| BookingFilter { search: Some(s.into()), ..Default::default() };
        assert!(by("ab12").matches(&l));
        assert!(by("EXAMPLE").matches(&l));
        assert!(by("dewi").matches(&l));
        assert!(!by("budi").matches(&l));
        assert!(by("   ").matches(&l));
    }

    #[test]
    fn test_status_user_and_date_range() {
        let l = listing("RNJ-1", "a@b.id", date(10));
        assert!(BookingFilter::default().with_status(BookingStatus::Pending).matches(&l));
        assert!(!BookingFilter::default().with_status(BookingStatus::Paid).matches(&l));
        assert!(!BookingFilter::for_user(Uuid::new_v4()).matches(&l));
        assert!(BookingFilter::for_user(l.booking.user_id).matches(&l));

        let range = BookingFilter {
            start_from: Some(date(5)),
            start_to: Some(date(9)),
            ..Default::default()
        };
        assert!(!range.matches(&l));
        assert_eq!(l.total_price, 3_600_000);
    }

    #[test]
    fn test_listing_serializes_flat() {
        let l = listing("RNJ-20261016-AB12", "a@b.id", date(3));
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["booking_code"], "RNJ-20261016-AB12");
        assert_eq!(json["total_price"], 3_600_000);
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_blank_and_all_lift_the_status_filter() {
        assert_eq!(status_param(None).unwrap(), None);
        assert_eq!(status_param(Some("")).unwrap(), None);
        assert_eq!(status_param(Some("all")).unwrap(), None);
        assert_eq!(status_param(Some("paid")).unwrap(), Some(BookingStatus::Paid));
        assert!(matches!(
            status_param(Some("lunas")),
            Err(BookingError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_query_ignores_blank_fields() {
        let query = BookingQuery {
            status: Some("all".into()),
            search: Some(String::new()),
            start_from: Some(String::new()),
            start_to: Some("  ".into()),
        };
        let filter = query.into_filter().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.start_from.is_none());
        assert!(filter.start_to.is_none());
        assert!(filter.matches(&listing("RNJ-1", "a@b.id", date(10))));
    }

    #[test]
    fn test_query_reports_bad_values_per_field() {
        let query = BookingQuery {
            status: Some("lunas".into()),
            start_from: Some("2026-11-05".into()),
            start_to: Some("besok".into()),
            ..Default::default()
        };
        let errors = query.into_filter().unwrap_err();
        assert!(errors.has("status"));
        assert!(!errors.has("start_from"));
        assert_eq!(errors.get("start_to"), Some("Format tanggal tidak valid."));
    }
}
