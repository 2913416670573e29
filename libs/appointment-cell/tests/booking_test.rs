use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use appointment_cell::models::{
    AppointmentChanges, AppointmentFilters, AvailabilityChanges, NewAppointment, NewAvailability, Period,
    Recurrence,
};
use appointment_cell::{
    AppointmentError, AppointmentService, AppointmentStatus, AvailabilityService, BookingChannel,
    DoctorDirectory,
};
use shared_utils::pagination::Pagination;
use shared_utils::test_utils::{TestContext, TestUser};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn appointment(client: i64, doctor: &TestUser, day: &str, at: &str, duration: i64) -> NewAppointment {
    NewAppointment {
        client_id: client,
        doctor_id: doctor.id,
        date: date(day),
        time: time(at),
        duration_minutes: duration,
        reason: Some("Suivi".to_string()),
        notes: None,
        notify_email: None,
        notify_sms: None,
    }
}

fn weekly(day: &str, start: &str, end: &str) -> NewAvailability {
    NewAvailability {
        date: date(day),
        start_time: time(start),
        end_time: time(end),
        recurrence: Recurrence::Weekly,
        recurrence_end_date: None,
    }
}

async fn setup() -> (TestContext, TestUser, TestUser) {
    let ctx = TestContext::new().await;
    let doctor = ctx.create_doctor("doctor@clinique.test").await;
    let patient = ctx.create_patient("patient@clinique.test").await;
    (ctx, doctor, patient)
}

#[tokio::test]
async fn test_staff_booking_creates_scheduled_appointment() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let booked = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, Some(doctor.id))
        .await
        .unwrap();

    assert_eq!(booked.status, AppointmentStatus::Scheduled);
    assert_eq!(booked.time, time("09:00"));
    assert!(booked.notify_email);
    assert!(!booked.notify_sms);
    assert_eq!(booked.created_by, Some(doctor.id));

    let view = service.get_view(booked.id).await.unwrap();
    assert_eq!(view.client_name, "Test Client");
    assert_eq!(view.doctor_name, "Test User");
}

#[tokio::test]
async fn test_overlapping_booking_is_rejected() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    let clash = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:15", 30), BookingChannel::Staff, None)
        .await;
    assert_matches!(clash, Err(AppointmentError::SlotTaken));

    // Back-to-back is fine.
    service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:30", 30), BookingChannel::Staff, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancelled_appointment_frees_the_slot() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let first = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "10:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();
    service
        .cancel_for_client(first.id, patient.client_id())
        .await
        .unwrap();

    assert!(service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "10:00", 30), BookingChannel::Staff, None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_completed_and_no_show_keep_their_slot() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let done = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-05", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();
    service
        .change_status(done.id, AppointmentStatus::Confirmed, Some(doctor.id))
        .await
        .unwrap();
    service
        .change_status(done.id, AppointmentStatus::Completed, Some(doctor.id))
        .await
        .unwrap();

    let missed = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-05", "10:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();
    service
        .change_status(missed.id, AppointmentStatus::NoShow, Some(doctor.id))
        .await
        .unwrap();

    for at in ["09:00", "10:00"] {
        let again = service
            .book(appointment(patient.client_id(), &doctor, "2030-03-05", at, 30), BookingChannel::Staff, None)
            .await;
        assert_matches!(again, Err(AppointmentError::SlotTaken));
    }
}

#[tokio::test]
async fn test_past_booking_is_rejected() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let result = service
        .book(appointment(patient.client_id(), &doctor, "2001-01-01", "09:00", 30), BookingChannel::Staff, None)
        .await;
    assert_matches!(result, Err(AppointmentError::InPast));
}

#[tokio::test]
async fn test_unknown_doctor_or_client_is_not_found() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let mut input = appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30);
    input.doctor_id = patient.id;
    assert_matches!(
        service.book(input, BookingChannel::Staff, None).await,
        Err(AppointmentError::DoctorNotFound)
    );

    let input = appointment(9999, &doctor, "2030-03-04", "09:00", 30);
    assert_matches!(
        service.book(input, BookingChannel::Staff, None).await,
        Err(AppointmentError::ClientNotFound)
    );
}

#[tokio::test]
async fn test_patient_booking_must_fit_availability() {
    let (ctx, doctor, patient) = setup().await;
    let availability = AvailabilityService::new(&ctx.state);
    let service = AppointmentService::new(&ctx.state);

    // Mondays 09:00-12:00
    availability
        .create(doctor.id, weekly("2030-03-04", "09:00", "12:00"))
        .await
        .unwrap();

    let outside = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "13:00", 30), BookingChannel::Patient, None)
        .await;
    assert_matches!(outside, Err(AppointmentError::OutsideAvailability));

    let wrong_day = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-05", "09:00", 30), BookingChannel::Patient, None)
        .await;
    assert_matches!(wrong_day, Err(AppointmentError::OutsideAvailability));

    let next_week = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-11", "11:30", 30), BookingChannel::Patient, None)
        .await;
    assert!(next_week.is_ok());
}

#[tokio::test]
async fn test_slots_exclude_booked_time_and_filter_by_period() {
    let (ctx, doctor, patient) = setup().await;
    let availability = AvailabilityService::new(&ctx.state);
    let service = AppointmentService::new(&ctx.state);

    availability
        .create(doctor.id, weekly("2030-03-04", "09:00", "11:00"))
        .await
        .unwrap();
    availability
        .create(doctor.id, weekly("2030-03-04", "14:00", "15:00"))
        .await
        .unwrap();
    service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:30", 30), BookingChannel::Patient, None)
        .await
        .unwrap();

    let slots = service
        .available_slots(doctor.id, date("2030-03-04"), 30, None)
        .await
        .unwrap();
    let starts: Vec<_> = slots.iter().map(|s| s.start.format("%H:%M").to_string()).collect();
    assert_eq!(starts, vec!["09:00", "10:00", "10:30", "14:00", "14:30"]);

    let afternoon = service
        .available_slots(doctor.id, date("2030-03-04"), 30, Some(Period::Afternoon))
        .await
        .unwrap();
    assert_eq!(afternoon.len(), 2);

    let past = service
        .available_slots(doctor.id, date("2001-01-01"), 30, None)
        .await
        .unwrap();
    assert!(past.is_empty());
}

#[tokio::test]
async fn test_status_transitions_follow_lifecycle() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let booked = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    let skipped = service
        .change_status(booked.id, AppointmentStatus::Completed, Some(doctor.id))
        .await;
    assert_matches!(
        skipped,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Scheduled,
            to: AppointmentStatus::Completed
        })
    );

    service
        .change_status(booked.id, AppointmentStatus::Confirmed, Some(doctor.id))
        .await
        .unwrap();
    let done = service
        .change_status(booked.id, AppointmentStatus::Completed, Some(doctor.id))
        .await
        .unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);

    let reschedule = service
        .update(
            booked.id,
            AppointmentChanges {
                time: Some(time("11:00")),
                ..Default::default()
            },
            None,
        )
        .await;
    assert_matches!(reschedule, Err(AppointmentError::NotModifiable(AppointmentStatus::Completed)));
}

#[tokio::test]
async fn test_other_doctor_cannot_touch_appointment() {
    let (ctx, doctor, patient) = setup().await;
    let other = ctx.create_doctor("other@clinique.test").await;
    let service = AppointmentService::new(&ctx.state);

    let booked = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    assert_matches!(
        service.change_status(booked.id, AppointmentStatus::Confirmed, Some(other.id)).await,
        Err(AppointmentError::NotOwner(_))
    );
}

#[tokio::test]
async fn test_reschedule_checks_overlap_but_ignores_itself() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let first = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();
    service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "10:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    let longer = service
        .update(
            first.id,
            AppointmentChanges {
                duration_minutes: Some(60),
                ..Default::default()
            },
            Some(doctor.id),
        )
        .await
        .unwrap();
    assert_eq!(longer.duration_minutes, 60);

    let clash = service
        .update(
            first.id,
            AppointmentChanges {
                time: Some(time("09:45")),
                ..Default::default()
            },
            None,
        )
        .await;
    assert_matches!(clash, Err(AppointmentError::SlotTaken));
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let (ctx, doctor, patient) = setup().await;
    let other_patient = ctx.create_patient("other@clinique.test").await;
    let service = AppointmentService::new(&ctx.state);

    for at in ["09:00", "10:00", "11:00"] {
        service
            .book(appointment(patient.client_id(), &doctor, "2030-03-04", at, 30), BookingChannel::Staff, None)
            .await
            .unwrap();
    }
    service
        .book(appointment(other_patient.client_id(), &doctor, "2030-03-05", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    let filters = AppointmentFilters {
        client_id: Some(patient.client_id()),
        ..Default::default()
    };
    let page = service
        .list(&filters, Pagination::new(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].appointment.time, time("11:00"));

    let from_tuesday = AppointmentFilters {
        date_from: Some(date("2030-03-05")),
        ..Default::default()
    };
    let page = service.list(&from_tuesday, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_soft_deleted_appointment_disappears() {
    let (ctx, doctor, patient) = setup().await;
    let service = AppointmentService::new(&ctx.state);

    let booked = service
        .book(appointment(patient.client_id(), &doctor, "2030-03-04", "09:00", 30), BookingChannel::Staff, None)
        .await
        .unwrap();

    service.soft_delete(booked.id).await.unwrap();
    assert_matches!(service.get(booked.id).await, Err(AppointmentError::NotFound));
    assert_matches!(service.soft_delete(booked.id).await, Err(AppointmentError::NotFound));

    let counts = service.counts_by_status().await.unwrap();
    assert_eq!(counts["scheduled"], 0);
    assert_eq!(counts.len(), 5);
}

#[tokio::test]
async fn test_availability_overlap_and_ownership() {
    let (ctx, doctor, _) = setup().await;
    let other = ctx.create_doctor("other@clinique.test").await;
    let availability = AvailabilityService::new(&ctx.state);

    let monday = availability
        .create(doctor.id, weekly("2030-03-04", "09:00", "12:00"))
        .await
        .unwrap();

    let overlapping = availability
        .create(doctor.id, weekly("2030-03-11", "11:00", "13:00"))
        .await;
    assert_matches!(overlapping, Err(AppointmentError::AvailabilityOverlap));

    // Another doctor is unaffected.
    availability
        .create(other.id, weekly("2030-03-04", "09:00", "12:00"))
        .await
        .unwrap();

    assert_matches!(
        availability.delete(monday.id, Some(other.id)).await,
        Err(AppointmentError::NotOwner(_))
    );
    availability.delete(monday.id, Some(doctor.id)).await.unwrap();

    let windows = availability.windows_on(doctor.id, date("2030-03-11")).await.unwrap();
    assert!(windows.is_empty());
}

#[tokio::test]
async fn test_availability_rejects_inverted_ranges() {
    let (ctx, doctor, _) = setup().await;
    let availability = AvailabilityService::new(&ctx.state);

    let ends_too_early = availability
        .create(
            doctor.id,
            NewAvailability {
                recurrence_end_date: Some(date("2030-03-01")),
                ..weekly("2030-03-04", "09:00", "12:00")
            },
        )
        .await;
    assert_matches!(ends_too_early, Err(AppointmentError::InvalidRecurrenceEnd));

    let window = availability
        .create(doctor.id, weekly("2030-03-04", "09:00", "12:00"))
        .await
        .unwrap();

    let inverted = availability
        .update(
            window.id,
            AvailabilityChanges {
                start_time: Some(time("12:30")),
                ..Default::default()
            },
            Some(doctor.id),
        )
        .await;
    assert_matches!(inverted, Err(AppointmentError::InvalidTimeRange));

    let early_end = availability
        .update(
            window.id,
            AvailabilityChanges {
                recurrence_end_date: Some(date("2030-03-03")),
                ..Default::default()
            },
            Some(doctor.id),
        )
        .await;
    assert_matches!(early_end, Err(AppointmentError::InvalidRecurrenceEnd));

    let unchanged = availability.get(window.id).await.unwrap();
    assert_eq!(unchanged.start_time, time("09:00"));
}

#[tokio::test]
async fn test_availability_list_by_range() {
    let (ctx, doctor, _) = setup().await;
    let availability = AvailabilityService::new(&ctx.state);

    availability
        .create(
            doctor.id,
            NewAvailability {
                recurrence: Recurrence::Once,
                ..weekly("2030-03-04", "09:00", "12:00")
            },
        )
        .await
        .unwrap();
    availability
        .create(doctor.id, weekly("2030-04-01", "09:00", "12:00"))
        .await
        .unwrap();

    let march = availability
        .list(Some(doctor.id), Some(date("2030-03-01")), Some(date("2030-03-31")))
        .await
        .unwrap();
    assert_eq!(march.len(), 1);

    let all = availability.list(Some(doctor.id), None, None).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_directory_lists_only_active_doctors() {
    let (ctx, doctor, _) = setup().await;
    let retired = ctx.create_doctor("retired@clinique.test").await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(retired.id)
        .execute(ctx.db())
        .await
        .unwrap();

    let directory = DoctorDirectory::new(&ctx.state);
    let doctors = directory.list_active_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, doctor.id);
    assert_matches!(
        directory.get_active_doctor(retired.id).await,
        Err(AppointmentError::DoctorNotFound)
    );
}
