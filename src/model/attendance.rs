use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    #[strum(serialize = "Present")]
    #[serde(rename = "Present")]
    Present,
    #[strum(serialize = "Half Day")]
    #[serde(rename = "Half Day")]
    HalfDay,
    #[strum(serialize = "Absent")]
    #[serde(rename = "Absent")]
    Absent,
}

/// Lower-cased fragments matched against stored labels, checked in order.
const STATUS_FRAGMENTS: [(&str, AttendanceStatus); 3] = [
    ("present", AttendanceStatus::Present),
    ("half", AttendanceStatus::HalfDay),
    ("absent", AttendanceStatus::Absent),
];

impl AttendanceStatus {
    /// Maps a loosely formatted label ("half_day", "HALF DAY", " present ")
    /// onto the canonical status. Unrecognised labels yield `None`.
    pub fn normalize(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        STATUS_FRAGMENTS
            .iter()
            .find(|(fragment, _)| label.contains(fragment))
            .map(|(_, status)| *status)
    }
}

/// One attendance row per (employee, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 12,
    "employeeId": 1,
    "name": "John Doe",
    "email": "john.doe@company.com",
    "date": "2025-07-14",
    "loginTime": "09:00:00",
    "logoutTime": "17:00:00",
    "hoursWorked": "8.00",
    "status": "Present",
    "createdAt": "2025-07-14T03:30:00Z",
    "updatedAt": "2025-07-14T11:30:00Z"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,
    pub email: String,
    #[schema(format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub login_time: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = Option<String>)]
    pub logout_time: Option<NaiveTime>,
    #[schema(example = "8.00", value_type = Option<String>)]
    pub hours_worked: Option<Decimal>,
    pub status: Option<AttendanceStatus>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.login_time.is_some() && self.logout_time.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.logout_time.is_some()
    }
}

/// Insert payload; the store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub name: String,
    pub email: String,
    pub date: NaiveDate,
    pub login_time: Option<NaiveTime>,
    pub hours_worked: Option<Decimal>,
    pub status: Option<AttendanceStatus>,
}

/// Fields written once when a session is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionClose {
    pub logout_time: NaiveTime,
    pub hours_worked: Decimal,
    pub status: AttendanceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip_through_strum() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "Half Day");
        assert_eq!("Half Day".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::HalfDay);
        assert_eq!(
            serde_json::to_value(AttendanceStatus::HalfDay).unwrap(),
            serde_json::json!("Half Day")
        );
    }

    #[test]
    fn normalize_tolerates_casing_and_separators() {
        assert_eq!(AttendanceStatus::normalize("PRESENT"), Some(AttendanceStatus::Present));
        assert_eq!(AttendanceStatus::normalize("half_day"), Some(AttendanceStatus::HalfDay));
        assert_eq!(AttendanceStatus::normalize(" Half Day "), Some(AttendanceStatus::HalfDay));
        assert_eq!(AttendanceStatus::normalize("absent"), Some(AttendanceStatus::Absent));
        assert_eq!(AttendanceStatus::normalize("on leave"), None);
    }
}
