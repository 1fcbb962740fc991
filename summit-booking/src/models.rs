use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use summit_catalog::Route;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Paid,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Menunggu Pembayaran",
            BookingStatus::Paid => "Sudah Dibayar",
            BookingStatus::Confirmed => "Dikonfirmasi",
            BookingStatus::Cancelled => "Dibatalkan",
            BookingStatus::Completed => "Selesai",
        }
    }

    /// Statuses that count as earned revenue.
    pub fn is_revenue(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Completed)
    }

    /// The single transition function: where `event` leads from `self`.
    pub fn next(self, event: &BookingEvent) -> Result<BookingStatus, BookingError> {
        use BookingStatus::*;

        let to = match (self, event) {
            (Pending, BookingEvent::SubmitPayment { .. }) => Paid,
            (Paid, BookingEvent::Confirm) => Confirmed,
            (Pending | Paid, BookingEvent::Cancel { .. }) => Cancelled,
            (Confirmed, BookingEvent::Complete) => Completed,
            (from, event) => {
                return Err(BookingError::InvalidTransition {
                    from,
                    to: event.target(),
                })
            }
        };
        Ok(to)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BookingError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Transfer,
    Ewallet,
    CreditCard,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Ewallet => "ewallet",
            PaymentMethod::CreditCard => "credit_card",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Transfer => "Transfer Bank",
            PaymentMethod::Ewallet => "E-Wallet",
            PaymentMethod::CreditCard => "Kartu Kredit",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(PaymentMethod::Transfer),
            "ewallet" => Ok(PaymentMethod::Ewallet),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            other => Err(BookingError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Something that moves a booking through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    /// Climber uploads proof of payment; `roster_size` is the number of
    /// participants currently recorded.
    SubmitPayment {
        method: PaymentMethod,
        proof: String,
        roster_size: usize,
    },
    /// Staff accepts the payment.
    Confirm,
    /// Climber withdraws or staff rejects.
    Cancel { reason: String },
    /// Staff closes a finished climb.
    Complete,
}

impl BookingEvent {
    pub fn target(&self) -> BookingStatus {
        match self {
            BookingEvent::SubmitPayment { .. } => BookingStatus::Paid,
            BookingEvent::Confirm => BookingStatus::Confirmed,
            BookingEvent::Cancel { .. } => BookingStatus::Cancelled,
            BookingEvent::Complete => BookingStatus::Completed,
        }
    }
}

/// A climb reservation for one route on one date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub user_id: Uuid,
    pub route_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub num_participants: i32,
    /// Whole rupiah, copied from the route at booking time.
    pub price_per_person: i64,
    pub payment_method: Option<PaymentMethod>,
    pub payment_proof: Option<String>,
    pub status: BookingStatus,
    pub notes: String,
    pub admin_notes: String,
    pub cancellation_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn new(
        booking_code: String,
        user_id: Uuid,
        route: &Route,
        start_date: NaiveDate,
        num_participants: i32,
        notes: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_code,
            user_id,
            route_id: route.id,
            start_date,
            end_date: route.end_date_for(start_date),
            num_participants,
            price_per_person: route.price_per_person,
            payment_method: None,
            payment_proof: None,
            status: BookingStatus::Pending,
            notes,
            admin_notes: String::new(),
            cancellation_reason: String::new(),
            created_at: now,
            updated_at: now,
            paid_at: None,
            confirmed_at: None,
            cancelled_at: None,
            completed_at: None,
        }
    }

    /// Derived on every read and written on every save; never stored on its own.
    pub fn total_price(&self) -> i64 {
        self.price_per_person * i64::from(self.num_participants)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn can_edit(&self) -> bool {
        self.status == BookingStatus::Pending
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Paid)
    }

    /// Participant data may be added or edited while pending or paid.
    pub fn accepts_roster_changes(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Paid)
    }

    pub fn ensure_roster_editable(&self) -> Result<(), BookingError> {
        if self.accepts_roster_changes() {
            Ok(())
        } else {
            Err(BookingError::NotEditable)
        }
    }

    /// Guards step 2 of the wizard: one more participant may be added.
    pub fn ensure_can_add_participant(&self, roster_size: usize) -> Result<(), BookingError> {
        self.ensure_roster_editable()?;
        if roster_size >= self.declared_participants() {
            return Err(BookingError::RosterFull);
        }
        Ok(())
    }

    /// Guards step 3 of the wizard before showing or accepting payment.
    pub fn ensure_payment_open(&self, roster_size: usize) -> Result<(), BookingError> {
        if roster_size < self.declared_participants() {
            return Err(BookingError::RosterIncomplete {
                have: roster_size,
                need: self.declared_participants(),
            });
        }
        if matches!(
            self.status,
            BookingStatus::Paid | BookingStatus::Confirmed | BookingStatus::Completed
        ) {
            return Err(BookingError::AlreadyPaid);
        }
        if self.status != BookingStatus::Pending {
            return Err(BookingError::NotEditable);
        }
        Ok(())
    }

    /// Participants may be removed only while pending and never below one.
    pub fn ensure_can_remove_participant(&self, roster_size: usize) -> Result<(), BookingError> {
        if self.status != BookingStatus::Pending {
            return Err(BookingError::NotEditable);
        }
        if roster_size <= 1 {
            return Err(BookingError::LastParticipant);
        }
        Ok(())
    }

    /// Keeps the declared count in step with the roster after a removal.
    pub fn sync_participant_count(&mut self, roster_size: usize) {
        self.num_participants = i32::try_from(roster_size).unwrap_or(i32::MAX);
        self.updated_at = Utc::now();
    }

    fn declared_participants(&self) -> usize {
        usize::try_from(self.num_participants).unwrap_or(0)
    }

    /// Applies a lifecycle event, checking its preconditions and stamping the
    /// matching timestamp. Returns the status the booking left.
    pub fn apply(&mut self, event: BookingEvent, now: DateTime<Utc>) -> Result<BookingStatus, BookingError> {
        let from = self.status;
        let to = from.next(&event)?;

        match event {
            BookingEvent::SubmitPayment { method, proof, roster_size } => {
                if roster_size != self.declared_participants() {
                    return Err(BookingError::RosterIncomplete {
                        have: roster_size,
                        need: self.declared_participants(),
                    });
                }
                if proof.trim().is_empty() {
                    return Err(BookingError::MissingPaymentProof);
                }
                self.payment_method = Some(method);
                self.payment_proof = Some(proof);
                self.paid_at = Some(now);
            }
            BookingEvent::Confirm => {
                if self.payment_proof.as_deref().map_or(true, |p| p.is_empty()) {
                    return Err(BookingError::MissingPaymentProof);
                }
                self.confirmed_at = Some(now);
            }
            BookingEvent::Cancel { reason } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(BookingError::ReasonRequired);
                }
                self.cancellation_reason = reason.to_string();
                self.cancelled_at = Some(now);
            }
            BookingEvent::Complete => {
                self.completed_at = Some(now);
            }
        }

        self.status = to;
        self.updated_at = now;
        Ok(from)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Status booking '{from}' tidak dapat diubah menjadi '{to}'.")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Lengkapi data peserta terlebih dahulu ({have}/{need}).")]
    RosterIncomplete { have: usize, need: usize },

    #[error("Semua data peserta sudah lengkap.")]
    RosterFull,

    #[error("Bukti pembayaran belum diupload.")]
    MissingPaymentProof,

    #[error("Booking ini sudah dibayar.")]
    AlreadyPaid,

    #[error("Alasan pembatalan wajib diisi.")]
    ReasonRequired,

    #[error("Booking ini sudah tidak dapat diubah.")]
    NotEditable,

    #[error("Minimal harus ada 1 peserta.")]
    LastParticipant,

    #[error("Status booking tidak dikenal: {0}")]
    UnknownStatus(String),

    #[error("Metode pembayaran tidak dikenal: {0}")]
    UnknownPaymentMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Route {
        Route::new(Uuid::new_v4(), "Jalur Senaru", "", "Desa Senaru", 3, 2, 22.5, 1_800_000)
    }

    fn booking(num_participants: i32) -> Booking {
        let start = NaiveDate::from_ymd_opt(2026, 11, 20).unwrap();
        Booking::new(
            "RNJ-20261016-AB12".into(),
            Uuid::new_v4(),
            &route(),
            start,
            num_participants,
            String::new(),
        )
    }

    fn pay(roster_size: usize) -> BookingEvent {
        BookingEvent::SubmitPayment {
            method: PaymentMethod::Transfer,
            proof: "bookings/payments/bukti.png".into(),
            roster_size,
        }
    }

    #[test]
    fn test_total_price_follows_count() {
        let mut b = booking(3);
        assert_eq!(b.total_price(), 5_400_000);
        b.sync_participant_count(2);
        assert_eq!(b.total_price(), 3_600_000);
    }

    #[test]
    fn test_end_date_from_route_duration() {
        let b = booking(1);
        assert_eq!(b.end_date, NaiveDate::from_ymd_opt(2026, 11, 22).unwrap());
    }

    #[test]
    fn test_booking_lifecycle() {
        let mut b = booking(2);
        let now = Utc::now();

        assert_eq!(b.apply(pay(2), now).unwrap(), BookingStatus::Pending);
        assert_eq!(b.status, BookingStatus::Paid);
        assert!(b.paid_at.is_some());

        b.apply(BookingEvent::Confirm, now).unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert!(b.confirmed_at.is_some());

        b.apply(BookingEvent::Complete, now).unwrap();
        assert_eq!(b.status, BookingStatus::Completed);
        assert!(b.completed_at.is_some());
    }

    #[test]
    fn test_payment_requires_full_roster() {
        let mut b = booking(3);
        let err = b.apply(pay(2), Utc::now()).unwrap_err();
        assert_eq!(err, BookingError::RosterIncomplete { have: 2, need: 3 });
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.paid_at.is_none());
    }

    #[test]
    fn test_confirm_requires_paid() {
        let mut b = booking(1);
        let err = b.apply(BookingEvent::Confirm, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Confirmed
            }
        );
    }

    #[test]
    fn test_cancel_only_from_pending_or_paid() {
        let cancel = || BookingEvent::Cancel { reason: "Jadwal berubah".into() };

        let mut pending = booking(1);
        pending.apply(cancel(), Utc::now()).unwrap();
        assert_eq!(pending.status, BookingStatus::Cancelled);
        assert_eq!(pending.cancellation_reason, "Jadwal berubah");

        let mut paid = booking(1);
        paid.apply(pay(1), Utc::now()).unwrap();
        paid.apply(cancel(), Utc::now()).unwrap();
        assert_eq!(paid.status, BookingStatus::Cancelled);

        let mut confirmed = booking(1);
        confirmed.apply(pay(1), Utc::now()).unwrap();
        confirmed.apply(BookingEvent::Confirm, Utc::now()).unwrap();
        assert!(matches!(
            confirmed.apply(cancel(), Utc::now()),
            Err(BookingError::InvalidTransition { .. })
        ));

        confirmed.apply(BookingEvent::Complete, Utc::now()).unwrap();
        assert!(confirmed.apply(cancel(), Utc::now()).is_err());
        assert_eq!(confirmed.status, BookingStatus::Completed);
    }

    #[test]
    fn test_cancel_requires_reason() {
        let mut b = booking(1);
        let err = b
            .apply(BookingEvent::Cancel { reason: "   ".into() }, Utc::now())
            .unwrap_err();
        assert_eq!(err, BookingError::ReasonRequired);
        assert_eq!(b.status, BookingStatus::Pending);
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut b = booking(1);
        b.apply(BookingEvent::Cancel { reason: "x".into() }, Utc::now()).unwrap();
        assert!(b.apply(pay(1), Utc::now()).is_err());
        assert!(b.apply(BookingEvent::Complete, Utc::now()).is_err());
    }

    #[test]
    fn test_participant_removal_guards() {
        let b = booking(2);
        assert!(b.ensure_can_remove_participant(2).is_ok());
        assert_eq!(b.ensure_can_remove_participant(1), Err(BookingError::LastParticipant));

        let mut paid = booking(1);
        paid.apply(pay(1), Utc::now()).unwrap();
        assert_eq!(paid.ensure_can_remove_participant(3), Err(BookingError::NotEditable));
    }

    #[test]
    fn test_payment_step_guards() {
        let mut b = booking(2);
        assert!(matches!(b.ensure_payment_open(1), Err(BookingError::RosterIncomplete { .. })));
        assert!(b.ensure_payment_open(2).is_ok());
        b.apply(pay(2), Utc::now()).unwrap();
        assert_eq!(b.ensure_payment_open(2), Err(BookingError::AlreadyPaid));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("archived".parse::<BookingStatus>().is_err());
        assert_eq!("credit_card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
    }
}
