mod common;

use chrono::Utc;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, Gender};
use appointment_cell::services::ScheduleAggregator;
use shared_utils::test_utils::local_time;

use common::{harness, request, wednesday_morning};

fn appointment(slot: &str) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        doctor_id: "d1".to_string(),
        patient_name: "Kiran".to_string(),
        patient_id: None,
        slot: slot.to_string(),
        notes: None,
        gender: Gender::Other,
        age: 29,
        status: AppointmentStatus::Upcoming,
        created_at: Utc::now(),
    }
}

#[test]
fn counts_are_bucketed_by_day_of_month() {
    let appointments = vec![
        appointment("Mar 12, 09:00 AM"),
        appointment("Mar 5, 09:00 AM"),
        appointment("Mar 5, 11:00 AM"),
        appointment("Mar 5, 03:30 PM"),
    ];

    let schedule = ScheduleAggregator::new().aggregate(appointments, wednesday_morning());

    assert_eq!(schedule.year, 2024);
    assert_eq!(schedule.month, 3);
    assert_eq!(schedule.days_in_month, 31);
    assert_eq!(schedule.per_day_counts.len(), 31);
    assert_eq!(schedule.count_for_day(5), 3);
    assert_eq!(schedule.count_for_day(12), 1);
    for day in (1..=31).filter(|d| *d != 5 && *d != 12) {
        assert_eq!(schedule.count_for_day(day), 0, "day {}", day);
    }
    assert_eq!(schedule.heat_levels[4], 3);
    assert_eq!(schedule.upcoming_count, 4);
    assert_eq!(schedule.today_count, 0);
}

#[test]
fn entries_are_chronological_with_flags() {
    let appointments = vec![
        appointment("Tomorrow, 09:00 AM"),
        appointment("Today, 02:00 PM"),
        appointment("Today, 09:00 AM"),
    ];

    let schedule = ScheduleAggregator::new().aggregate(appointments, wednesday_morning());

    let slots: Vec<&str> = schedule
        .entries
        .iter()
        .map(|e| e.appointment.slot.as_str())
        .collect();
    assert_eq!(slots, vec!["Today, 09:00 AM", "Today, 02:00 PM", "Tomorrow, 09:00 AM"]);

    assert_eq!(schedule.today_count, 2);
    assert!(schedule.entries[0].is_past);
    assert_eq!(
        schedule.entries[0].available_actions,
        vec![AppointmentStatus::Done, AppointmentStatus::NoShow]
    );
    assert!(!schedule.entries[1].is_past);
    assert_eq!(schedule.entries[1].available_actions, vec![AppointmentStatus::Cancelled]);
}

#[test]
fn other_months_are_not_bucketed() {
    let schedule = ScheduleAggregator::new().aggregate(
        vec![appointment("Apr 2, 09:00 AM"), appointment("Feb 28, 09:00 AM")],
        wednesday_morning(),
    );

    assert_eq!(schedule.upcoming_count, 2);
    assert!(schedule.per_day_counts.iter().all(|c| *c == 0));
}

#[test]
fn heat_is_capped_at_five() {
    let appointments = (0..7).map(|h| appointment(&format!("Mar 20, 0{}:00 AM", h + 1))).collect();

    let schedule = ScheduleAggregator::new().aggregate(appointments, wednesday_morning());

    assert_eq!(schedule.count_for_day(20), 7);
    assert_eq!(schedule.heat_levels[19], 5);
}

#[test]
fn calendar_offset_counts_from_sunday() {
    // 1 March 2024 was a Friday
    let schedule = ScheduleAggregator::new().aggregate(Vec::new(), wednesday_morning());
    assert_eq!(schedule.first_weekday_offset, 5);

    let september = ScheduleAggregator::new().aggregate(Vec::new(), local_time(2024, 9, 10, 8, 0));
    assert_eq!(september.first_weekday_offset, 0);
    assert_eq!(september.days_in_month, 30);
}

#[test]
fn malformed_label_is_flagged_not_dropped() {
    let schedule = ScheduleAggregator::new().aggregate(
        vec![appointment("Tomorrow, sometime")],
        wednesday_morning(),
    );

    assert_eq!(schedule.entries.len(), 1);
    let entry = &schedule.entries[0];
    assert!(entry.slot_warning.is_some());
    assert_eq!(entry.scheduled_at, local_time(2024, 3, 7, 0, 0));
    assert_eq!(schedule.count_for_day(7), 1);
}

#[tokio::test]
async fn doctor_schedule_excludes_cancelled() {
    let h = harness();
    let kept = h
        .booking
        .book_appointment(request("d1", "Tomorrow, 09:00 AM"), None)
        .await
        .unwrap();
    let dropped = h
        .booking
        .book_appointment(request("d1", "Tomorrow, 11:30 AM"), None)
        .await
        .unwrap();
    h.booking
        .book_appointment(request("d2", "Tomorrow, 09:00 AM"), None)
        .await
        .unwrap();
    h.booking.cancel_appointment(dropped.id).await.unwrap();

    let schedule = h.booking.doctor_schedule("d1").await.unwrap();

    assert_eq!(schedule.upcoming_count, 1);
    assert_eq!(schedule.entries[0].appointment.id, kept.id);
    assert_eq!(schedule.count_for_day(7), 1);
}
