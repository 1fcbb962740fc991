use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Who triggered a workflow change.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Climber,
    Staff,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingStatusChanged {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub from: String,
    pub to: String,
    pub actor: Actor,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CheckInReviewed {
    pub checkin_id: Uuid,
    pub booking_code: String,
    pub participant_id: Uuid,
    pub status: String,
    pub reviewer_id: Uuid,
    pub at: DateTime<Utc>,
}

impl BookingStatusChanged {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl CheckInReviewed {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Actor, BookingStatusChanged, CheckInReviewed};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_status_change_payload() {
        let event = BookingStatusChanged {
            booking_id: Uuid::new_v4(),
            booking_code: "RNJ-20260101-AB12".to_string(),
            from: "paid".to_string(),
            to: "cancelled".to_string(),
            actor: Actor::Staff,
            actor_id: Uuid::new_v4(),
            reason: Some("Bukti pembayaran tidak valid".to_string()),
            at: Utc::now(),
        };
        let json = event.to_json();
        assert_eq!(json["actor"], "staff");
        assert_eq!(json["to"], "cancelled");
        assert_eq!(json["booking_code"], "RNJ-20260101-AB12");
    }

    #[test]
    fn test_review_payload() {
        let event = CheckInReviewed {
            checkin_id: Uuid::new_v4(),
            booking_code: "RNJ-20260101-AB12".to_string(),
            participant_id: Uuid::new_v4(),
            status: "verified".to_string(),
            reviewer_id: Uuid::new_v4(),
            at: Utc::now(),
        };
        assert_eq!(event.to_json()["status"], "verified");
    }
}
