// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use shared_models::error::AppError;
use shared_utils::validation::FieldErrors;

// ==============================================================================
// TIME HELPERS
// ==============================================================================

pub(crate) fn serialize_hhmm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

/// Minutes since midnight.
pub fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

pub fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    if !(0..24 * 60).contains(&minutes) {
        return None;
    }
    let seconds = u32::try_from(minutes * 60).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

/// Half-open interval overlap on minute offsets.
pub fn ranges_overlap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Still occupies the doctor's time.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown appointment status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    pub client_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub reminder_sent: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn start_minutes(&self) -> i64 {
        minutes_of(self.time)
    }

    pub fn end_minutes(&self) -> i64 {
        self.start_minutes() + self.duration_minutes
    }
}

/// Appointment joined with the display names shown in lists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppointmentView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: Appointment,
    pub client_name: String,
    pub doctor_name: String,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Recurrence {
    #[serde(rename = "none", alias = "once")]
    #[sqlx(rename = "none")]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::Once
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Availability {
    pub id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "serialize_hhmm")]
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub recurrence_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Availability {
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        occurs_on(self.date, self.recurrence, self.recurrence_end_date, day)
    }

    /// True when at least one occurrence falls inside `[from, to]`.
    pub fn occurs_between(&self, from: NaiveDate, to: NaiveDate) -> bool {
        if to < from || to < self.date {
            return false;
        }
        let first = from.max(self.date);
        first
            .iter_days()
            .take_while(|day| *day <= to)
            .take(366)
            .any(|day| self.occurs_on(day))
    }

    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        (self.start_time, self.end_time)
    }
}

pub fn occurs_on(
    first: NaiveDate,
    recurrence: Recurrence,
    until: Option<NaiveDate>,
    day: NaiveDate,
) -> bool {
    if day < first {
        return false;
    }
    if let Some(end) = until {
        if day > end {
            return false;
        }
    }

    match recurrence {
        Recurrence::Once => day == first,
        Recurrence::Daily => true,
        Recurrence::Weekly => day.weekday() == first.weekday(),
        Recurrence::Monthly => day.day() == first.day(),
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub fn of(time: NaiveTime) -> Self {
        match time.hour() {
            0..=11 => Period::Morning,
            12..=16 => Period::Afternoon,
            _ => Period::Evening,
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" | "matin" => Ok(Period::Morning),
            "afternoon" | "apres-midi" => Ok(Period::Afternoon),
            "evening" | "soir" => Ok(Period::Evening),
            other => Err(format!("Unknown period: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    #[serde(serialize_with = "serialize_hhmm")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_hhmm")]
    pub end: NaiveTime,
    pub period: Period,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DoctorSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    /// Ignored for patient bookings, which always use the caller's record.
    pub client_id: Option<i64>,
    /// Ignored for doctor bookings, which always use the caller.
    pub doctor_id: Option<i64>,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<i64>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_sms: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub client_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_sms: Option<bool>,
}

impl BookAppointmentRequest {
    /// `client_id` and `doctor_id` override the body when the caller's role
    /// fixes them.
    pub fn validate(
        self,
        client_id: Option<i64>,
        doctor_id: Option<i64>,
        default_duration: i64,
    ) -> Result<NewAppointment, AppError> {
        let mut errors = FieldErrors::new();

        let client_id = client_id.or(self.client_id);
        errors.check(client_id.is_some(), "client_id", "client_id is required");
        let doctor_id = doctor_id.or(self.doctor_id);
        errors.check(doctor_id.is_some(), "doctor_id", "doctor_id is required");

        let date = errors.date(&self.date, "date");
        let time = errors.time(&self.time, "time");
        let duration_minutes = self.duration_minutes.unwrap_or(default_duration);
        errors.duration(duration_minutes, "duration_minutes");

        errors.into_result()?;

        match (client_id, doctor_id, date, time) {
            (Some(client_id), Some(doctor_id), Some(date), Some(time)) => Ok(NewAppointment {
                client_id,
                doctor_id,
                date,
                time,
                duration_minutes,
                reason: self.reason.filter(|r| !r.trim().is_empty()),
                notes: self.notes,
                notify_email: self.notify_email,
                notify_sms: self.notify_sms,
            }),
            _ => Err(AppError::BadRequest("Invalid appointment request".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_sms: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentChanges {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub notify_email: Option<bool>,
    pub notify_sms: Option<bool>,
}

impl AppointmentChanges {
    pub fn moves_slot(&self) -> bool {
        self.date.is_some() || self.time.is_some() || self.duration_minutes.is_some()
    }
}

impl UpdateAppointmentRequest {
    pub fn validate(self) -> Result<AppointmentChanges, AppError> {
        let mut errors = FieldErrors::new();

        let date = self.date.as_deref().and_then(|d| errors.date(d, "date"));
        let time = self.time.as_deref().and_then(|t| errors.time(t, "time"));
        if let Some(duration) = self.duration_minutes {
            errors.duration(duration, "duration_minutes");
        }

        errors.into_result()?;

        Ok(AppointmentChanges {
            date,
            time,
            duration_minutes: self.duration_minutes,
            reason: self.reason,
            notes: self.notes,
            notify_email: self.notify_email,
            notify_sms: self.notify_sms,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Query-string filters shared by every appointment listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    pub client_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilters {
    pub client_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AppointmentQuery {
    pub fn filters(&self) -> Result<AppointmentFilters, AppError> {
        let mut errors = FieldErrors::new();
        let date_from = self.date_from.as_deref().and_then(|d| errors.date(d, "date_from"));
        let date_to = self.date_to.as_deref().and_then(|d| errors.date(d, "date_to"));
        errors.into_result()?;

        Ok(AppointmentFilters {
            client_id: self.client_id,
            doctor_id: self.doctor_id,
            status: self.status,
            date_from,
            date_to,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: String,
    pub duration: Option<i64>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAvailabilityRequest {
    /// Only honoured for administrators; doctors always create their own.
    pub doctor_id: Option<i64>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub recurrence_end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailability {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub recurrence_end_date: Option<NaiveDate>,
}

impl NewAvailability {
    pub fn check_range(&self) -> Result<(), AppointmentError> {
        if self.start_time >= self.end_time {
            return Err(AppointmentError::InvalidTimeRange);
        }
        if let Some(end) = self.recurrence_end_date {
            if end < self.date {
                return Err(AppointmentError::InvalidRecurrenceEnd);
            }
        }
        Ok(())
    }
}

impl CreateAvailabilityRequest {
    pub fn validate(self) -> Result<NewAvailability, AppError> {
        let mut errors = FieldErrors::new();

        let date = errors.date(&self.date, "date");
        let start_time = errors.time(&self.start_time, "start_time");
        let end_time = errors.time(&self.end_time, "end_time");
        let recurrence_end_date = self
            .recurrence_end_date
            .as_deref()
            .and_then(|d| errors.date(d, "recurrence_end_date"));

        if let (Some(start), Some(end)) = (start_time, end_time) {
            errors.check(start < end, "end_time", "End time must be after start time");
        }

        errors.into_result()?;

        match (date, start_time, end_time) {
            (Some(date), Some(start_time), Some(end_time)) => Ok(NewAvailability {
                date,
                start_time,
                end_time,
                recurrence: self.recurrence,
                recurrence_end_date,
            }),
            _ => Err(AppError::BadRequest("Invalid availability request".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityChanges {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_end_date: Option<NaiveDate>,
}

impl UpdateAvailabilityRequest {
    pub fn validate(self) -> Result<AvailabilityChanges, AppError> {
        let mut errors = FieldErrors::new();

        let date = self.date.as_deref().and_then(|d| errors.date(d, "date"));
        let start_time = self.start_time.as_deref().and_then(|t| errors.time(t, "start_time"));
        let end_time = self.end_time.as_deref().and_then(|t| errors.time(t, "end_time"));
        let recurrence_end_date = self
            .recurrence_end_date
            .as_deref()
            .and_then(|d| errors.date(d, "recurrence_end_date"));

        errors.into_result()?;

        Ok(AvailabilityChanges {
            date,
            start_time,
            end_time,
            recurrence: self.recurrence,
            recurrence_end_date,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    ClientNotFound,

    #[error("Availability not found")]
    AvailabilityNotFound,

    #[error("Appointments cannot be booked in the past")]
    InPast,

    #[error("The requested time is outside the doctor's availability")]
    OutsideAvailability,

    #[error("The requested time slot is already booked")]
    SlotTaken,

    #[error("The availability overlaps an existing one")]
    AvailabilityOverlap,

    #[error("End time must be after start time")]
    InvalidTimeRange,

    #[error("Recurrence end date must not be before the first date")]
    InvalidRecurrenceEnd,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is {0} and can no longer be changed")]
    NotModifiable(AppointmentStatus),

    #[error("Not allowed to modify this {0}")]
    NotOwner(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::ClientNotFound
            | AppointmentError::AvailabilityNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::InPast => AppError::validation("date", &err.to_string()),
            AppointmentError::OutsideAvailability => AppError::validation("time", &err.to_string()),
            AppointmentError::InvalidTimeRange => AppError::validation("end_time", &err.to_string()),
            AppointmentError::InvalidRecurrenceEnd => {
                AppError::validation("recurrence_end_date", &err.to_string())
            }
            AppointmentError::SlotTaken | AppointmentError::AvailabilityOverlap => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::NotModifiable(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::NotOwner(_) => AppError::Forbidden(err.to_string()),
            AppointmentError::Database(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_status_transitions() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(NoShow.is_terminal());
        assert!(Confirmed.is_active());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("no_show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert!("pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_one_off_availability() {
        let first = d("2030-03-04");
        assert!(occurs_on(first, Recurrence::Once, None, first));
        assert!(!occurs_on(first, Recurrence::Once, None, d("2030-03-11")));
    }

    #[test]
    fn test_weekly_availability_respects_end_date() {
        let first = d("2030-03-04");
        let until = Some(d("2030-03-18"));
        assert!(occurs_on(first, Recurrence::Weekly, until, d("2030-03-11")));
        assert!(occurs_on(first, Recurrence::Weekly, until, d("2030-03-18")));
        assert!(!occurs_on(first, Recurrence::Weekly, until, d("2030-03-25")));
        assert!(!occurs_on(first, Recurrence::Weekly, until, d("2030-03-12")));
        assert!(!occurs_on(first, Recurrence::Weekly, until, d("2030-02-25")));
    }

    #[test]
    fn test_daily_and_monthly_availability() {
        let first = d("2030-01-15");
        assert!(occurs_on(first, Recurrence::Daily, None, d("2030-06-01")));
        assert!(occurs_on(first, Recurrence::Monthly, None, d("2030-02-15")));
        assert!(!occurs_on(first, Recurrence::Monthly, None, d("2030-02-16")));
    }

    #[test]
    fn test_period_boundaries() {
        assert_eq!(Period::of(t("11:59")), Period::Morning);
        assert_eq!(Period::of(t("12:00")), Period::Afternoon);
        assert_eq!(Period::of(t("16:59")), Period::Afternoon);
        assert_eq!(Period::of(t("17:00")), Period::Evening);
        assert_eq!("Matin".parse::<Period>().unwrap(), Period::Morning);
    }

    #[test]
    fn test_recurrence_serde_uses_none() {
        assert_eq!(serde_json::to_string(&Recurrence::Once).unwrap(), "\"none\"");
        let parsed: Recurrence = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(parsed, Recurrence::Weekly);
    }

    #[test]
    fn test_book_request_rejects_out_of_range_duration() {
        let request = BookAppointmentRequest {
            client_id: Some(1),
            doctor_id: Some(2),
            date: "2030-03-04".to_string(),
            time: "09:00".to_string(),
            duration_minutes: Some(300),
            reason: None,
            notes: None,
            notify_email: None,
            notify_sms: None,
        };

        assert_matches!(
            request.validate(None, None, 30),
            Err(AppError::Validation { errors, .. }) if errors[0].field == "duration_minutes"
        );
    }

    #[test]
    fn test_book_request_uses_default_duration_and_caller_client() {
        let request = BookAppointmentRequest {
            client_id: Some(99),
            doctor_id: Some(2),
            date: "2030-03-04".to_string(),
            time: "09:30".to_string(),
            duration_minutes: None,
            reason: Some("  ".to_string()),
            notes: None,
            notify_email: None,
            notify_sms: None,
        };

        let appointment = request.validate(Some(5), None, 45).unwrap();
        assert_eq!(appointment.client_id, 5);
        assert_eq!(appointment.duration_minutes, 45);
        assert_eq!(appointment.time, t("09:30"));
        assert_eq!(appointment.reason, None);
    }

    #[test]
    fn test_availability_request_requires_ordered_times() {
        let request = CreateAvailabilityRequest {
            doctor_id: None,
            date: "2030-03-04".to_string(),
            start_time: "14:00".to_string(),
            end_time: "09:00".to_string(),
            recurrence: Recurrence::Weekly,
            recurrence_end_date: None,
        };
        assert_matches!(request.validate(), Err(AppError::Validation { .. }));
    }

    #[test]
    fn test_availability_range_checks() {
        let window = NewAvailability {
            date: d("2030-03-04"),
            start_time: t("09:00"),
            end_time: t("12:00"),
            recurrence: Recurrence::Weekly,
            recurrence_end_date: Some(d("2030-03-04")),
        };
        assert!(window.check_range().is_ok());

        let ends_before_start = NewAvailability {
            recurrence_end_date: Some(d("2030-03-03")),
            ..window.clone()
        };
        assert_matches!(ends_before_start.check_range(), Err(AppointmentError::InvalidRecurrenceEnd));

        let inverted = NewAvailability {
            start_time: t("12:00"),
            end_time: t("12:00"),
            ..window
        };
        assert_matches!(inverted.check_range(), Err(AppointmentError::InvalidTimeRange));
    }

    #[test]
    fn test_minutes_helpers() {
        assert_eq!(minutes_of(t("09:30")), 570);
        assert_eq!(time_from_minutes(570), Some(t("09:30")));
        assert_eq!(time_from_minutes(24 * 60), None);
        assert!(ranges_overlap(540, 570, 560, 600));
        assert!(!ranges_overlap(540, 570, 570, 600));
    }

    #[test]
    fn test_error_mapping() {
        assert_matches!(AppError::from(AppointmentError::SlotTaken), AppError::Conflict(_));
        assert_matches!(AppError::from(AppointmentError::NotFound), AppError::NotFound(_));
        assert_matches!(
            AppError::from(AppointmentError::InPast),
            AppError::Validation { errors, .. } if errors[0].field == "date"
        );
    }
}
