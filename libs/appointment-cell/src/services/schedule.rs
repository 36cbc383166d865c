// libs/appointment-cell/src/services/schedule.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use shared_models::slot;

use crate::models::{Appointment, DoctorSchedule, ScheduleEntry};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Heat-map shades stop growing at this many appointments per day.
pub const MAX_HEAT_LEVEL: u8 = 5;

pub fn heat_level(count: u32) -> u8 {
    count.min(MAX_HEAT_LEVEL as u32) as u8
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Builds the doctor's calendar view from a set of appointments. The caller
/// decides which appointments are included; nothing here filters by status.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleAggregator {
    lifecycle: AppointmentLifecycleService,
}

impl ScheduleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, appointments: Vec<Appointment>, now: NaiveDateTime) -> DoctorSchedule {
        let today = now.date();
        let (year, month) = (today.year(), today.month());
        let days = days_in_month(year, month);

        let mut entries: Vec<ScheduleEntry> = appointments
            .into_iter()
            .map(|appointment| {
                let (scheduled_at, slot_warning) = match slot::try_resolve(&appointment.slot, now) {
                    Ok(at) => (at, None),
                    Err(malformed) => {
                        warn!("Schedule entry {}: {}", appointment.id, malformed);
                        (malformed.fallback, Some(malformed.reason))
                    }
                };
                let available_actions = self.lifecycle.available_actions(&appointment, now);
                ScheduleEntry {
                    is_past: scheduled_at <= now,
                    scheduled_at,
                    available_actions,
                    slot_warning,
                    appointment,
                }
            })
            .collect();

        entries.sort_by_key(|entry| entry.scheduled_at);

        let mut per_day_counts = vec![0u32; days as usize];
        let mut today_count = 0;
        for entry in &entries {
            let date = entry.scheduled_at.date();
            if date == today {
                today_count += 1;
            }
            if date.year() == year && date.month() == month {
                per_day_counts[date.day0() as usize] += 1;
            }
        }

        let heat_levels = per_day_counts.iter().map(|&c| heat_level(c)).collect();
        let first_weekday_offset = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| first.weekday().num_days_from_sunday())
            .unwrap_or(0);

        debug!(
            "Aggregated {} appointments for {}-{:02} ({} today)",
            entries.len(),
            year,
            month,
            today_count
        );

        DoctorSchedule {
            today_count,
            upcoming_count: entries.len(),
            year,
            month,
            days_in_month: days,
            first_weekday_offset,
            per_day_counts,
            heat_levels,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn heat_is_capped() {
        assert_eq!(heat_level(0), 0);
        assert_eq!(heat_level(3), 3);
        assert_eq!(heat_level(5), 5);
        assert_eq!(heat_level(12), 5);
    }
}
