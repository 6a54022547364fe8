use chrono::{DateTime, Duration, Utc};

use super::models::Target;

/// The interval actually honoured for a target: its own setting, but never
/// faster than the account's plan allows.
pub fn effective_interval(target: &Target, account_min_interval: i64) -> Duration {
    Duration::seconds(target.interval_seconds.max(account_min_interval))
}

pub fn is_due(target: &Target, now: DateTime<Utc>, account_min_interval: i64) -> bool {
    if !target.is_active {
        return false;
    }
    match target.last_checked {
        None => true,
        Some(last_checked) => now - last_checked >= effective_interval(target, account_min_interval),
    }
}

/// Picks the targets due for a check at `now`.
///
/// The result is ordered by `last_checked` ascending with never-checked targets
/// first, so the longest-waiting targets go out first when capacity is short.
pub fn select_due<F>(targets: Vec<Target>, now: DateTime<Utc>, min_interval_for: F) -> Vec<Target>
where
    F: Fn(i32) -> i64,
{
    let mut due: Vec<Target> = targets
        .into_iter()
        .filter(|t| is_due(t, now, min_interval_for(t.account_id)))
        .collect();
    // None sorts before Some, which gives the nulls-first order.
    due.sort_by_key(|t| t.last_checked);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::models::Status;
    use chrono::TimeZone;

    fn target(id: i32, interval: i64, last_checked: Option<DateTime<Utc>>) -> Target {
        Target {
            id,
            account_id: 1,
            name: format!("site-{id}"),
            url: format!("https://site-{id}.example"),
            interval_seconds: interval,
            is_active: true,
            last_checked,
            current_status: Status::Unknown,
            last_up: None,
            last_down: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_never_checked_active_targets_are_always_due() {
        for now in [at(0), at(1), at(10_000_000)] {
            let due = select_due(vec![target(1, 60, None)], now, |_| 1800);
            assert_eq!(due.len(), 1);
        }
    }

    #[test]
    fn test_inactive_targets_are_never_due() {
        let mut t = target(1, 60, None);
        t.is_active = false;
        assert!(select_due(vec![t], at(0), |_| 0).is_empty());
    }

    #[test]
    fn test_effective_interval_uses_account_minimum() {
        let t = target(1, 60, Some(at(0)));
        assert_eq!(effective_interval(&t, 1800), Duration::seconds(1800));
        assert!(!is_due(&t, at(60), 1800));
        assert!(!is_due(&t, at(1799), 1800));
        assert!(is_due(&t, at(1800), 1800));
    }

    #[test]
    fn test_configured_interval_wins_when_longer() {
        let t = target(1, 3600, Some(at(0)));
        assert!(!is_due(&t, at(1800), 300));
        assert!(is_due(&t, at(3600), 300));
    }

    #[test]
    fn test_due_is_monotonic_in_elapsed_time() {
        let t = target(1, 300, Some(at(0)));
        let first_due = (0..2000).find(|s| is_due(&t, at(*s), 600)).unwrap();
        assert_eq!(first_due, 600);
        assert!((first_due..first_due + 5000).all(|s| is_due(&t, at(s), 600)));
    }

    #[test]
    fn test_check_then_wait_full_interval() {
        let t = target(1, 300, None);
        assert!(is_due(&t, at(0), 1800));

        let checked = Target {
            last_checked: Some(at(0)),
            ..t
        };
        assert!(!is_due(&checked, at(300), 1800));
        assert!(!is_due(&checked, at(1799), 1800));
        assert!(is_due(&checked, at(1800), 1800));
    }

    #[test]
    fn test_due_targets_are_ordered_oldest_first_with_nulls_leading() {
        let targets = vec![
            target(1, 60, Some(at(500))),
            target(2, 60, None),
            target(3, 60, Some(at(100))),
            target(4, 60, Some(at(990))),
        ];
        let ids: Vec<i32> = select_due(targets, at(1000), |_| 60)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_minimum_interval_is_looked_up_per_account() {
        let mut slow = target(1, 60, Some(at(0)));
        slow.account_id = 10;
        let mut fast = target(2, 60, Some(at(0)));
        fast.account_id = 20;

        let due = select_due(vec![slow, fast], at(300), |account| {
            if account == 10 { 1800 } else { 60 }
        });
        assert_eq!(due.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
    }
}
