//! Due-time arithmetic shared by reminders and list rendering.
//!
//! All values are epoch milliseconds; a due time `<= 0` means "no due time".

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Minutes a due time moves when a reminder is snoozed.
pub const SNOOZE_MINUTES: u32 = 15;

/// Reminder fire time: `due - lead * 60_000`.
pub fn fire_time(due_at_ms: i64, lead_minutes: u32) -> i64 {
    due_at_ms.saturating_sub(i64::from(lead_minutes).saturating_mul(MINUTE_MS))
}

pub fn is_overdue(due_at_ms: i64, now_ms: i64) -> bool {
    due_at_ms > 0 && due_at_ms < now_ms
}

/// Whether `now_ms` falls inside the reminder window `[fire, due)`.
pub fn should_show_notification(due_at_ms: i64, lead_minutes: u32, now_ms: i64) -> bool {
    if due_at_ms <= 0 {
        return false;
    }
    now_ms >= fire_time(due_at_ms, lead_minutes) && now_ms < due_at_ms
}

/// Whole days until due, or `-1` when there is no due time or it passed.
pub fn days_until_due(due_at_ms: i64, now_ms: i64) -> i64 {
    if due_at_ms <= 0 {
        return -1;
    }
    let diff = due_at_ms - now_ms;
    if diff < 0 {
        return -1;
    }
    diff / DAY_MS
}

/// Human-readable distance to the due time, e.g. `In 3 hours`.
///
/// Returns an empty string when no due time is set.
pub fn time_until_due_label(due_at_ms: i64, now_ms: i64) -> String {
    if due_at_ms <= 0 {
        return String::new();
    }

    let diff = due_at_ms - now_ms;
    if diff < 0 {
        return "Overdue".to_string();
    }

    let minutes = diff / MINUTE_MS;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        plural_label(days, "day")
    } else if hours > 0 {
        plural_label(hours, "hour")
    } else if minutes > 0 {
        plural_label(minutes, "minute")
    } else {
        "Now".to_string()
    }
}

fn plural_label(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("In 1 {unit}")
    } else {
        format!("In {count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{
        days_until_due, fire_time, is_overdue, should_show_notification, time_until_due_label,
        DAY_MS, HOUR_MS, MINUTE_MS,
    };

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn fire_time_subtracts_lead_minutes() {
        assert_eq!(fire_time(NOW, 15), NOW - 15 * MINUTE_MS);
        assert_eq!(fire_time(NOW, 0), NOW);
    }

    #[test]
    fn overdue_ignores_unset_due_time() {
        assert!(!is_overdue(0, NOW));
        assert!(is_overdue(NOW - 1, NOW));
        assert!(!is_overdue(NOW, NOW));
    }

    #[test]
    fn notification_window_is_half_open() {
        let due = NOW + 10 * MINUTE_MS;
        assert!(should_show_notification(due, 15, NOW));
        assert!(!should_show_notification(due, 5, NOW));
        assert!(!should_show_notification(NOW, 15, NOW));
        assert!(!should_show_notification(0, 15, NOW));
    }

    #[test]
    fn days_until_due_floors_and_flags_missing() {
        assert_eq!(days_until_due(0, NOW), -1);
        assert_eq!(days_until_due(NOW - 1, NOW), -1);
        assert_eq!(days_until_due(NOW + DAY_MS + HOUR_MS, NOW), 1);
        assert_eq!(days_until_due(NOW + HOUR_MS, NOW), 0);
    }

    #[test]
    fn labels_pick_largest_unit() {
        assert_eq!(time_until_due_label(0, NOW), "");
        assert_eq!(time_until_due_label(NOW - 1, NOW), "Overdue");
        assert_eq!(time_until_due_label(NOW + 30 * 1000, NOW), "Now");
        assert_eq!(time_until_due_label(NOW + MINUTE_MS, NOW), "In 1 minute");
        assert_eq!(time_until_due_label(NOW + 3 * HOUR_MS, NOW), "In 3 hours");
        assert_eq!(time_until_due_label(NOW + 2 * DAY_MS, NOW), "In 2 days");
    }
}
