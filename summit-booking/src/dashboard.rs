//! Read-only projections behind the climber and staff dashboards.
//!
//! Everything here works on already-loaded listings; the repositories only
//! filter, the counting and summing happens in these functions.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use summit_catalog::RouteListing;
use uuid::Uuid;

use crate::checkin::CheckInStatus;
use crate::filters::{BookingListing, CheckInListing};
use crate::models::BookingStatus;

const RECENT_STAFF: usize = 10;
const RECENT_CLIMBER: usize = 5;
const UPCOMING_WINDOW_DAYS: i64 = 7;
const TOP_ROUTES_DASHBOARD: usize = 5;
const TOP_ROUTES_REPORT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteStat {
    pub route_id: Uuid,
    pub route_name: String,
    pub mountain_name: String,
    pub bookings: usize,
    /// Summed over every booking on the route, whatever its status.
    pub revenue: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckInTotals {
    pub total: usize,
    pub pending: usize,
    pub verified: usize,
    pub rejected: usize,
}

impl CheckInTotals {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a CheckInStatus>) -> Self {
        let mut totals = Self::default();
        for status in statuses {
            totals.total += 1;
            match status {
                CheckInStatus::Pending => totals.pending += 1,
                CheckInStatus::Verified => totals.verified += 1,
                CheckInStatus::Rejected => totals.rejected += 1,
            }
        }
        totals
    }

    pub fn from_listings(listings: &[CheckInListing]) -> Self {
        Self::tally(listings.iter().map(|l| &l.checkin.status))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffOverview {
    pub bookings_this_month: usize,
    pub confirmed_bookings: usize,
    pub awaiting_verification: usize,
    pub revenue_this_month: i64,
    pub pending_checkins: usize,
    pub recent_bookings: Vec<BookingListing>,
    pub upcoming_climbs: Vec<BookingListing>,
    pub top_routes: Vec<RouteStat>,
}

pub fn staff_overview(
    bookings: &[BookingListing],
    routes: &[RouteListing],
    pending_checkins: usize,
    today: NaiveDate,
) -> StaffOverview {
    let this_month: Vec<&BookingListing> = bookings
        .iter()
        .filter(|l| same_month(l.booking.created_at.date_naive(), today))
        .collect();

    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let mut upcoming_climbs: Vec<BookingListing> = bookings
        .iter()
        .filter(|l| {
            l.booking.status == BookingStatus::Confirmed
                && l.booking.start_date >= today
                && l.booking.start_date <= horizon
        })
        .cloned()
        .collect();
    upcoming_climbs.sort_by_key(|l| l.booking.start_date);

    StaffOverview {
        bookings_this_month: this_month.len(),
        confirmed_bookings: count_status(bookings, BookingStatus::Confirmed),
        awaiting_verification: count_status(bookings, BookingStatus::Paid),
        revenue_this_month: revenue(this_month.iter().copied()),
        pending_checkins,
        recent_bookings: most_recent(bookings, RECENT_STAFF),
        upcoming_climbs,
        top_routes: top_routes(routes, bookings, TOP_ROUTES_DASHBOARD),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub bookings: usize,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusStat {
    pub status: BookingStatus,
    pub label: &'static str,
    pub count: usize,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub year: i32,
    /// One entry per month of `year` that has revenue-bearing bookings.
    pub monthly: Vec<MonthlyRevenue>,
    pub top_routes: Vec<RouteStat>,
    pub status_stats: Vec<StatusStat>,
}

pub fn reports(bookings: &[BookingListing], routes: &[RouteListing], today: NaiveDate) -> Report {
    let year = today.year();
    let mut months: HashMap<u32, MonthlyRevenue> = HashMap::new();
    for l in bookings {
        let created = l.booking.created_at.date_naive();
        if created.year() != year || !l.booking.status.is_revenue() {
            continue;
        }
        let entry = months.entry(created.month()).or_insert(MonthlyRevenue {
            month: created.month(),
            bookings: 0,
            revenue: 0,
        });
        entry.bookings += 1;
        entry.revenue += l.booking.total_price();
    }
    let mut monthly: Vec<MonthlyRevenue> = months.into_values().collect();
    monthly.sort_by_key(|m| m.month);

    let status_stats = BookingStatus::ALL
        .into_iter()
        .map(|status| {
            let matching = bookings.iter().filter(|l| l.booking.status == status);
            StatusStat {
                status,
                label: status.label(),
                count: matching.clone().count(),
                total: matching.map(|l| l.booking.total_price()).sum(),
            }
        })
        .collect();

    Report {
        year,
        monthly,
        top_routes: top_routes(routes, bookings, TOP_ROUTES_REPORT),
        status_stats,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClimberOverview {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub completed_bookings: usize,
    pub upcoming_trip: Option<BookingListing>,
    /// True when the upcoming trip starts within a day.
    pub checkin_ready: bool,
    pub recent_bookings: Vec<BookingListing>,
}

/// `bookings` must already be limited to one climber.
pub fn climber_overview(bookings: &[BookingListing], today: NaiveDate) -> ClimberOverview {
    let upcoming_trip = bookings
        .iter()
        .filter(|l| l.booking.status == BookingStatus::Confirmed && l.booking.start_date >= today)
        .min_by_key(|l| l.booking.start_date)
        .cloned();

    let checkin_ready = upcoming_trip
        .as_ref()
        .is_some_and(|l| (l.booking.start_date - today).num_days() <= 1);

    ClimberOverview {
        total_bookings: bookings.len(),
        active_bookings: bookings
            .iter()
            .filter(|l| l.booking.status == BookingStatus::Confirmed && l.booking.start_date >= today)
            .count(),
        completed_bookings: count_status(bookings, BookingStatus::Completed),
        upcoming_trip,
        checkin_ready,
        recent_bookings: most_recent(bookings, RECENT_CLIMBER),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClimbHistory {
    pub bookings: Vec<BookingListing>,
    pub total_climbs: usize,
    pub total_participants: i64,
}

pub fn climb_history(bookings: &[BookingListing]) -> ClimbHistory {
    let mut completed: Vec<BookingListing> = bookings
        .iter()
        .filter(|l| l.booking.status == BookingStatus::Completed)
        .cloned()
        .collect();
    completed.sort_by(|a, b| b.booking.start_date.cmp(&a.booking.start_date));

    ClimbHistory {
        total_climbs: completed.len(),
        total_participants: completed
            .iter()
            .map(|l| i64::from(l.booking.num_participants))
            .sum(),
        bookings: completed,
    }
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

fn count_status(bookings: &[BookingListing], status: BookingStatus) -> usize {
    bookings.iter().filter(|l| l.booking.status == status).count()
}

fn revenue<'a>(bookings: impl Iterator<Item = &'a BookingListing>) -> i64 {
    bookings
        .filter(|l| l.booking.status.is_revenue())
        .map(|l| l.booking.total_price())
        .sum()
}

fn most_recent(bookings: &[BookingListing], n: usize) -> Vec<BookingListing> {
    let mut sorted: Vec<BookingListing> = bookings.to_vec();
    sorted.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
    sorted.truncate(n);
    sorted
}

/// Every route ranked by booking count, routes without bookings included.
fn top_routes(routes: &[RouteListing], bookings: &[BookingListing], n: usize) -> Vec<RouteStat> {
    let mut stats: HashMap<Uuid, RouteStat> = routes
        .iter()
        .map(|r| {
            let stat = RouteStat {
                route_id: r.route.id,
                route_name: r.route.name.clone(),
                mountain_name: r.mountain_name.clone(),
                bookings: 0,
                revenue: 0,
            };
            (r.route.id, stat)
        })
        .collect();
    for l in bookings {
        let stat = stats.entry(l.booking.route_id).or_insert_with(|| RouteStat {
            route_id: l.booking.route_id,
            route_name: l.route_name.clone(),
            mountain_name: l.mountain_name.clone(),
            bookings: 0,
            revenue: 0,
        });
        stat.bookings += 1;
        stat.revenue += l.booking.total_price();
    }
    let mut ranked: Vec<RouteStat> = stats.into_values().collect();
    ranked.sort_by(|a, b| b.bookings.cmp(&a.bookings).then_with(|| a.route_name.cmp(&b.route_name)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, BookingEvent, PaymentMethod};
    use chrono::Utc;
    use summit_catalog::Route;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn listing(route: &Route, start_in_days: i64, n: i32, status: BookingStatus) -> BookingListing {
        let mut booking = Booking::new(
            format!("RNJ-{}", Uuid::new_v4()),
            Uuid::nil(),
            route,
            today() + Duration::days(start_in_days),
            n,
            String::new(),
        );
        let now = Utc::now();
        let pay = BookingEvent::SubmitPayment {
            method: PaymentMethod::Transfer,
            proof: "p.png".into(),
            roster_size: n as usize,
        };
        match status {
            BookingStatus::Pending => {}
            BookingStatus::Paid => {
                booking.apply(pay, now).unwrap();
            }
            BookingStatus::Confirmed => {
                booking.apply(pay, now).unwrap();
                booking.apply(BookingEvent::Confirm, now).unwrap();
            }
            BookingStatus::Completed => {
                booking.apply(pay, now).unwrap();
                booking.apply(BookingEvent::Confirm, now).unwrap();
                booking.apply(BookingEvent::Complete, now).unwrap();
            }
            BookingStatus::Cancelled => {
                booking.apply(BookingEvent::Cancel { reason: "x".into() }, now).unwrap();
            }
        }
        BookingListing::new(
            booking,
            route.name.clone(),
            route.slug.clone(),
            "Gunung Rinjani".into(),
            "a@b.id".into(),
            "A".into(),
            "B".into(),
        )
    }

    fn routes() -> (Route, Route) {
        let senaru = Route::new(Uuid::new_v4(), "Jalur Senaru", "", "Senaru", 3, 2, 22.5, 1_800_000);
        let hemat = Route::new(Uuid::new_v4(), "Paket Hemat 2H1M", "", "Sembalun", 2, 1, 15.0, 1_000_000);
        (senaru, hemat)
    }

    fn catalog(routes: &[&Route]) -> Vec<RouteListing> {
        routes
            .iter()
            .map(|r| RouteListing {
                route: (*r).clone(),
                mountain_name: "Gunung Rinjani".into(),
                mountain_slug: "gunung-rinjani".into(),
            })
            .collect()
    }

    #[test]
    fn test_staff_overview_counts_and_revenue() {
        let (senaru, hemat) = routes();
        let bookings = vec![
            listing(&senaru, 3, 3, BookingStatus::Confirmed),
            listing(&senaru, 30, 1, BookingStatus::Paid),
            listing(&senaru, 30, 2, BookingStatus::Completed),
            listing(&hemat, 10, 2, BookingStatus::Cancelled),
        ];
        let torean = Route::new(Uuid::new_v4(), "Jalur Torean", "", "Torean", 3, 2, 20.0, 2_000_000);
        let overview = staff_overview(&bookings, &catalog(&[&senaru, &hemat, &torean]), 4, today());

        assert_eq!(overview.bookings_this_month, 4);
        assert_eq!(overview.confirmed_bookings, 1);
        assert_eq!(overview.awaiting_verification, 1);
        assert_eq!(overview.revenue_this_month, 5_400_000 + 3_600_000);
        assert_eq!(overview.pending_checkins, 4);
        assert_eq!(overview.upcoming_climbs.len(), 1);
        assert_eq!(overview.top_routes[0].route_name, "Jalur Senaru");
        assert_eq!(overview.top_routes[0].bookings, 3);
        assert_eq!(overview.top_routes[0].revenue, 10_800_000);
        assert_eq!(overview.top_routes[1].revenue, 2_000_000);
        assert_eq!(overview.top_routes.len(), 3);
        assert_eq!(overview.top_routes[2].route_name, "Jalur Torean");
        assert_eq!((overview.top_routes[2].bookings, overview.top_routes[2].revenue), (0, 0));
    }

    #[test]
    fn test_reports_status_stats_cover_every_status() {
        let (senaru, _) = routes();
        let bookings = vec![
            listing(&senaru, 20, 3, BookingStatus::Confirmed),
            listing(&senaru, 20, 1, BookingStatus::Pending),
        ];
        let report = reports(&bookings, &catalog(&[&senaru]), today());

        assert_eq!(report.status_stats.len(), 5);
        let confirmed = report
            .status_stats
            .iter()
            .find(|s| s.status == BookingStatus::Confirmed)
            .unwrap();
        assert_eq!((confirmed.count, confirmed.total), (1, 5_400_000));
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].revenue, 5_400_000);
        assert_eq!(report.top_routes[0].revenue, 5_400_000 + 1_800_000);
    }

    #[test]
    fn test_climber_overview_checkin_ready() {
        let (senaru, _) = routes();
        let soon = vec![
            listing(&senaru, 1, 1, BookingStatus::Confirmed),
            listing(&senaru, 12, 1, BookingStatus::Confirmed),
            listing(&senaru, -20, 2, BookingStatus::Completed),
        ];
        let overview = climber_overview(&soon, today());
        assert_eq!(overview.total_bookings, 3);
        assert_eq!(overview.active_bookings, 2);
        assert_eq!(overview.completed_bookings, 1);
        assert!(overview.checkin_ready);

        let later = vec![listing(&senaru, 12, 1, BookingStatus::Confirmed)];
        assert!(!climber_overview(&later, today()).checkin_ready);
    }

    #[test]
    fn test_history_sums_participants() {
        let (senaru, hemat) = routes();
        let bookings = vec![
            listing(&senaru, -40, 2, BookingStatus::Completed),
            listing(&hemat, -10, 4, BookingStatus::Completed),
            listing(&hemat, 10, 4, BookingStatus::Confirmed),
        ];
        let history = climb_history(&bookings);
        assert_eq!(history.total_climbs, 2);
        assert_eq!(history.total_participants, 6);
        assert_eq!(history.bookings[0].route_name, "Paket Hemat 2H1M");
    }

    #[test]
    fn test_checkin_totals() {
        let totals = CheckInTotals::tally(&[
            CheckInStatus::Pending,
            CheckInStatus::Pending,
            CheckInStatus::Rejected,
        ]);
        assert_eq!(
            totals,
            CheckInTotals { total: 3, pending: 2, verified: 0, rejected: 1 }
        );
    }
}
