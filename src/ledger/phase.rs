use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::ElectionStatus;

/// The voting-relevant phase of an election, derived from its stored status and the time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Upcoming,
    Active,
    Closed,
}

/// Resolve the effective phase of an election.
///
/// Time always wins over the stored status: nothing is open after `end`, and any
/// combination of status and time not explicitly covered resolves to `Closed`.
/// The window is inclusive at both ends.
pub fn resolve_phase(
    status: ElectionStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Phase {
    match status {
        ElectionStatus::Closed => Phase::Closed,
        _ if now > end => Phase::Closed,
        ElectionStatus::Active if start <= now => Phase::Active,
        ElectionStatus::Pending if now < start => Phase::Upcoming,
        // Active before its start, or Pending inside its window.
        _ => Phase::Closed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap()
    }

    /// Instants around a one-hour window starting at `t0`.
    fn probes() -> Vec<DateTime<Utc>> {
        let start = t0();
        let end = start + Duration::hours(1);
        vec![
            start - Duration::days(365),
            start - Duration::milliseconds(1),
            start,
            start + Duration::milliseconds(1),
            start + Duration::minutes(30),
            end - Duration::milliseconds(1),
            end,
            end + Duration::milliseconds(1),
            end + Duration::days(365),
        ]
    }

    #[test]
    fn stored_closed_is_always_closed() {
        let end = t0() + Duration::hours(1);
        for now in probes() {
            assert_eq!(
                resolve_phase(ElectionStatus::Closed, t0(), end, now),
                Phase::Closed
            );
        }
    }

    #[test]
    fn after_end_is_always_closed() {
        let end = t0() + Duration::hours(1);
        for status in ElectionStatus::ALL {
            for now in probes().into_iter().filter(|now| *now > end) {
                assert_eq!(resolve_phase(status, t0(), end, now), Phase::Closed);
            }
        }
    }

    #[test]
    fn active_window_is_inclusive() {
        let start = t0();
        let end = start + Duration::hours(1);
        let status = ElectionStatus::Active;

        assert_eq!(resolve_phase(status, start, end, start), Phase::Active);
        assert_eq!(
            resolve_phase(status, start, end, start + Duration::minutes(30)),
            Phase::Active
        );
        assert_eq!(resolve_phase(status, start, end, end), Phase::Active);
        assert_eq!(
            resolve_phase(status, start, end, end + Duration::milliseconds(1)),
            Phase::Closed
        );
    }

    #[test]
    fn pending_before_start_is_upcoming() {
        let start = t0() + Duration::hours(1);
        let end = start + Duration::hours(1);
        assert_eq!(
            resolve_phase(ElectionStatus::Pending, start, end, t0()),
            Phase::Upcoming
        );
    }

    #[test]
    fn inconsistent_combinations_degrade_to_closed() {
        let start = t0();
        let end = start + Duration::hours(1);

        // Opened early by an administrator: still not votable.
        assert_eq!(
            resolve_phase(
                ElectionStatus::Active,
                start,
                end,
                start - Duration::milliseconds(1)
            ),
            Phase::Closed
        );

        // Window reached but never opened.
        assert_eq!(
            resolve_phase(ElectionStatus::Pending, start, end, start),
            Phase::Closed
        );
        assert_eq!(
            resolve_phase(ElectionStatus::Pending, start, end, end),
            Phase::Closed
        );
    }

    #[test]
    fn total_and_deterministic() {
        let end = t0() + Duration::hours(1);
        for status in ElectionStatus::ALL {
            for now in probes() {
                let first = resolve_phase(status, t0(), end, now);
                let second = resolve_phase(status, t0(), end, now);
                assert_eq!(first, second);
                // Only an administratively active election can ever be open.
                if first == Phase::Active {
                    assert_eq!(status, ElectionStatus::Active);
                }
            }
        }
    }
}
