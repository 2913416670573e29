// libs/appointment-cell/src/services/slots.rs
use chrono::NaiveTime;

use crate::models::{minutes_of, ranges_overlap, time_from_minutes, Period, TimeSlot};

/// Bookable slots inside `windows`, stepping by `duration` minutes from the
/// start of each window. Slots overlapping a `booked` range (minute offsets)
/// or starting before `not_before` are dropped.
pub fn generate_slots(
    windows: &[(NaiveTime, NaiveTime)],
    booked: &[(i64, i64)],
    duration: i64,
    not_before: Option<NaiveTime>,
) -> Vec<TimeSlot> {
    if duration <= 0 {
        return Vec::new();
    }

    let earliest = not_before.map(minutes_of).unwrap_or(0);
    let mut slots = Vec::new();

    for (window_start, window_end) in windows {
        let end = minutes_of(*window_end);
        let mut start = minutes_of(*window_start);

        while start + duration <= end {
            let slot_end = start + duration;
            let free = !booked
                .iter()
                .any(|(b_start, b_end)| ranges_overlap(start, slot_end, *b_start, *b_end));

            if free && start >= earliest {
                if let (Some(s), Some(e)) = (time_from_minutes(start), time_from_minutes(slot_end)) {
                    slots.push(TimeSlot {
                        start: s,
                        end: e,
                        period: Period::of(s),
                    });
                }
            }
            start += duration;
        }
    }

    slots.sort_by_key(|slot| slot.start);
    slots.dedup_by_key(|slot| slot.start);
    slots
}

pub fn filter_by_period(slots: Vec<TimeSlot>, period: Option<Period>) -> Vec<TimeSlot> {
    match period {
        Some(period) => slots.into_iter().filter(|slot| slot.period == period).collect(),
        None => slots,
    }
}

/// True when `[start, start + duration)` fits entirely inside one window.
pub fn fits_in_windows(windows: &[(NaiveTime, NaiveTime)], start: NaiveTime, duration: i64) -> bool {
    let start = minutes_of(start);
    let end = start + duration;
    windows
        .iter()
        .any(|(w_start, w_end)| minutes_of(*w_start) <= start && end <= minutes_of(*w_end))
}
