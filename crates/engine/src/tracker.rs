//! Shared, synchronized resource-availability state.
//!
//! One tracker per resource kind (teachers, rooms, groups), each guarded
//! by a single `parking_lot::Mutex` so that concurrent availability
//! queries and reservations against the same tracker are linearizable.
//! Check-then-write is a single critical section (`try_reserve`), so two
//! subject tasks can never both claim the same resource/day/hour cell.

use crate::config::{DAY_END, FIRST_HOUR};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use types::{
    Activity, ActivityKind, Catalog, DayOfWeek, Frequency, GroupId, HourSpan, RoomId, TeacherId,
};

/// Per-day occupancy lists for one resource id.
type DayGrid = [Vec<Activity>; 5];

fn occupied(grid: &DayGrid, day: DayOfWeek, hour: u8) -> bool {
    grid[day.index()].iter().any(|a| a.span.contains(hour))
}

fn span_free(grid: &DayGrid, day: DayOfWeek, span: HourSpan) -> bool {
    (span.start..span.end).all(|hour| !occupied(grid, day, hour))
}

pub struct ResourceTracker<Id> {
    grids: Mutex<HashMap<Id, DayGrid>>,
}

impl<Id: Eq + Hash + Clone> Default for ResourceTracker<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Eq + Hash + Clone> ResourceTracker<Id> {
    pub fn new() -> Self {
        Self {
            grids: Mutex::new(HashMap::new()),
        }
    }

    /// Register a placeholder without an availability check. Used only
    /// while seeding externally imposed busy/closed windows.
    fn seed(&self, id: &Id, activity: Activity) {
        let mut grids = self.grids.lock();
        let grid = grids.entry(id.clone()).or_default();
        grid[activity.day.index()].push(activity);
    }

    /// True iff no activity, real or placeholder, covers the hour.
    /// Unknown resource ids are available (fail-open).
    pub fn is_available(&self, id: &Id, day: DayOfWeek, hour: u8) -> bool {
        let grids = self.grids.lock();
        grids.get(id).map_or(true, |grid| !occupied(grid, day, hour))
    }

    /// Atomic check-then-reserve: the activity is registered for every
    /// hour of its span, or not at all.
    pub fn try_reserve(&self, id: &Id, activity: &Activity) -> bool {
        let mut grids = self.grids.lock();
        let grid = grids.entry(id.clone()).or_default();
        if !span_free(grid, activity.day, activity.span) {
            return false;
        }
        grid[activity.day.index()].push(activity.clone());
        true
    }

    /// All-or-nothing reservation across several ids of this tracker
    /// (a shared course blocking every enrolled group at once).
    pub fn try_reserve_all(&self, ids: &[Id], activity: &Activity) -> bool {
        let mut grids = self.grids.lock();
        for id in ids {
            if let Some(grid) = grids.get(id) {
                if !span_free(grid, activity.day, activity.span) {
                    return false;
                }
            }
        }
        for id in ids {
            let grid = grids.entry(id.clone()).or_default();
            grid[activity.day.index()].push(activity.clone());
        }
        true
    }

    /// Reserve the first candidate whose whole span is free. With the
    /// candidates in ascending capacity order this is best-fit room
    /// selection, done atomically under the tracker lock.
    pub fn try_reserve_first(
        &self,
        candidates: &[Id],
        day: DayOfWeek,
        span: HourSpan,
        make: impl Fn(&Id) -> Activity,
    ) -> Option<Id> {
        let mut grids = self.grids.lock();
        for id in candidates {
            let grid = grids.entry(id.clone()).or_default();
            if span_free(grid, day, span) {
                grid[day.index()].push(make(id));
                return Some(id.clone());
            }
        }
        None
    }

    /// Back out a reservation taken earlier in a multi-tracker placement
    /// that a later tracker refused. Placeholders are never removed.
    pub fn release(&self, id: &Id, activity: &Activity) {
        if activity.kind.is_placeholder() {
            return;
        }
        let mut grids = self.grids.lock();
        if let Some(grid) = grids.get_mut(id) {
            let day = &mut grid[activity.day.index()];
            if let Some(pos) = day.iter().position(|a| a == activity) {
                day.remove(pos);
            }
        }
    }

    /// Full occupancy history for one resource, for reporting.
    pub fn activities_for(&self, id: &Id) -> Vec<Activity> {
        let grids = self.grids.lock();
        grids
            .get(id)
            .map(|grid| grid.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

/// The three trackers of one generation run. Constructed fresh per run,
/// shared across subject tasks, discarded with the run.
pub struct Trackers {
    pub teachers: ResourceTracker<TeacherId>,
    pub rooms: ResourceTracker<RoomId>,
    pub groups: ResourceTracker<GroupId>,
}

impl Trackers {
    pub fn build(catalog: &Catalog) -> Self {
        Trackers {
            teachers: seed_teachers(catalog),
            rooms: seed_rooms(catalog),
            groups: ResourceTracker::new(),
        }
    }
}

fn seed_teachers(catalog: &Catalog) -> ResourceTracker<TeacherId> {
    let tracker = ResourceTracker::new();
    for teacher in catalog.teachers() {
        for (&day, spans) in &teacher.busy {
            for &span in spans {
                if span.end <= span.start {
                    continue;
                }
                tracker.seed(
                    &teacher.id,
                    Activity {
                        subject: "BUSY".into(),
                        group: "N/A".into(),
                        teacher: teacher.id.clone(),
                        room: "N/A".into(),
                        day,
                        span,
                        kind: ActivityKind::Busy,
                        subgroup: None,
                        frequency: Frequency::Weekly,
                    },
                );
            }
        }
    }
    tracker
}

/// Every hour of the fixed daily window not covered by the owning
/// place's operating schedule becomes a closed placeholder.
fn seed_rooms(catalog: &Catalog) -> ResourceTracker<RoomId> {
    let tracker = ResourceTracker::new();
    for place in catalog.places() {
        for day in DayOfWeek::ALL {
            let open = place.schedule.get(&day).map(Vec::as_slice).unwrap_or(&[]);
            for span in closed_spans(open) {
                for room in &place.rooms {
                    tracker.seed(
                        &room.id,
                        Activity {
                            subject: "CLOSED".into(),
                            group: "N/A".into(),
                            teacher: "N/A".into(),
                            room: room.id.clone(),
                            day,
                            span,
                            kind: ActivityKind::Closed,
                            subgroup: None,
                            frequency: Frequency::Weekly,
                        },
                    );
                }
            }
        }
    }
    tracker
}

/// Contiguous spans of `FIRST_HOUR..DAY_END` not covered by `open`.
fn closed_spans(open: &[HourSpan]) -> Vec<HourSpan> {
    let mut spans = Vec::new();
    let mut run_start: Option<u8> = None;
    for hour in FIRST_HOUR..DAY_END {
        let is_open = open.iter().any(|s| s.contains(hour));
        match (is_open, run_start) {
            (false, None) => run_start = Some(hour),
            (true, Some(start)) => {
                spans.push(HourSpan::new(start, hour));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        spans.push(HourSpan::new(start, DAY_END));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use types::{Group, Place, Room, Subject, SubjectCapability, Teacher};

    fn activity(room: &str, day: DayOfWeek, start: u8, end: u8) -> Activity {
        Activity {
            subject: "Algebra".into(),
            group: "G1".into(),
            teacher: "Smith".into(),
            room: room.into(),
            day,
            span: HourSpan::new(start, end),
            kind: ActivityKind::Seminar,
            subgroup: None,
            frequency: Frequency::Weekly,
        }
    }

    #[test]
    fn unknown_resource_is_available() {
        let tracker: ResourceTracker<RoomId> = ResourceTracker::new();
        assert!(tracker.is_available(&"R1".into(), DayOfWeek::Monday, 8));
    }

    #[test]
    fn try_reserve_rejects_overlap_atomically() {
        let tracker: ResourceTracker<RoomId> = ResourceTracker::new();
        let id: RoomId = "R1".into();
        assert!(tracker.try_reserve(&id, &activity("R1", DayOfWeek::Monday, 8, 10)));
        // overlapping tail hour
        assert!(!tracker.try_reserve(&id, &activity("R1", DayOfWeek::Monday, 9, 11)));
        // back-to-back is fine
        assert!(tracker.try_reserve(&id, &activity("R1", DayOfWeek::Monday, 10, 12)));
        assert!(!tracker.is_available(&id, DayOfWeek::Monday, 9));
        assert!(tracker.is_available(&id, DayOfWeek::Monday, 12));
        assert!(tracker.is_available(&id, DayOfWeek::Tuesday, 9));
    }

    #[test]
    fn try_reserve_all_is_all_or_nothing() {
        let tracker: ResourceTracker<GroupId> = ResourceTracker::new();
        let g1: GroupId = "G1".into();
        let g2: GroupId = "G2".into();
        assert!(tracker.try_reserve(&g2, &activity("R9", DayOfWeek::Monday, 9, 10)));

        let shared = activity("R1", DayOfWeek::Monday, 8, 10);
        assert!(!tracker.try_reserve_all(&[g1.clone(), g2.clone()], &shared));
        // G1 must be untouched by the failed attempt
        assert!(tracker.is_available(&g1, DayOfWeek::Monday, 8));

        let later = activity("R1", DayOfWeek::Monday, 10, 12);
        assert!(tracker.try_reserve_all(&[g1.clone(), g2.clone()], &later));
        assert!(!tracker.is_available(&g1, DayOfWeek::Monday, 11));
        assert!(!tracker.is_available(&g2, DayOfWeek::Monday, 11));
    }

    #[test]
    fn try_reserve_first_picks_earliest_free_candidate() {
        let tracker: ResourceTracker<RoomId> = ResourceTracker::new();
        let small: RoomId = "R30".into();
        let big: RoomId = "R50".into();
        let span = HourSpan::new(8, 10);
        let make = |id: &RoomId| activity(&id.0, DayOfWeek::Monday, 8, 10);

        let picked = tracker.try_reserve_first(
            &[small.clone(), big.clone()],
            DayOfWeek::Monday,
            span,
            make,
        );
        assert_eq!(picked, Some(small.clone()));

        // small now occupied, same slot falls through to the next fit
        let picked = tracker.try_reserve_first(
            &[small.clone(), big.clone()],
            DayOfWeek::Monday,
            span,
            make,
        );
        assert_eq!(picked, Some(big));
    }

    #[test]
    fn release_backs_out_real_activities_only() {
        let tracker: ResourceTracker<TeacherId> = ResourceTracker::new();
        let id: TeacherId = "Smith".into();
        let a = activity("R1", DayOfWeek::Friday, 8, 9);
        assert!(tracker.try_reserve(&id, &a));
        tracker.release(&id, &a);
        assert!(tracker.is_available(&id, DayOfWeek::Friday, 8));

        let mut busy = a.clone();
        busy.kind = ActivityKind::Busy;
        tracker.seed(&id, busy.clone());
        tracker.release(&id, &busy);
        assert!(!tracker.is_available(&id, DayOfWeek::Friday, 8));
    }

    #[test]
    fn teacher_busy_windows_are_seeded() {
        let catalog = Catalog::new(
            vec![Subject {
                id: "Algebra".into(),
                language: None,
                courses_per_week: 1,
                course_len: 1,
                seminars_per_week: 0,
                seminar_len: 0,
                laboratories_per_week: 0.0,
                laboratory_len: 0,
            }],
            vec![Teacher {
                id: "Smith".into(),
                busy: [(DayOfWeek::Monday, vec![HourSpan::new(8, 11)])]
                    .into_iter()
                    .collect(),
                max_hours_per_week: 20,
                preferred_buildings: vec![],
                languages: vec![],
                subjects: [("Algebra".into(), SubjectCapability::default())]
                    .into_iter()
                    .collect(),
            }],
            vec![Group {
                id: "G1".into(),
                size: 20,
                language: None,
                subjects: vec!["Algebra".into()],
                seminar_split: 1,
                laboratory_split: 1,
            }],
            vec![],
        );
        let trackers = Trackers::build(&catalog);
        let smith: TeacherId = "Smith".into();
        assert!(!trackers.teachers.is_available(&smith, DayOfWeek::Monday, 10));
        assert!(trackers.teachers.is_available(&smith, DayOfWeek::Monday, 11));
        assert!(trackers.teachers.is_available(&smith, DayOfWeek::Tuesday, 10));
    }

    #[test]
    fn rooms_outside_operating_hours_are_closed() {
        let place = Place {
            id: "Main".into(),
            schedule: [(DayOfWeek::Monday, vec![HourSpan::new(10, 14)])]
                .into_iter()
                .collect(),
            rooms: vec![Room {
                id: "R1".into(),
                capacity: 30,
                no_course: false,
                no_seminar: false,
                no_laboratory: false,
            }],
        };
        let catalog = Catalog::new(vec![], vec![], vec![], vec![place]);
        let trackers = Trackers::build(&catalog);
        let r1: RoomId = "R1".into();
        assert!(!trackers.rooms.is_available(&r1, DayOfWeek::Monday, 8));
        assert!(trackers.rooms.is_available(&r1, DayOfWeek::Monday, 10));
        assert!(trackers.rooms.is_available(&r1, DayOfWeek::Monday, 13));
        assert!(!trackers.rooms.is_available(&r1, DayOfWeek::Monday, 14));
        // no schedule entry for Tuesday: closed all day
        assert!(!trackers.rooms.is_available(&r1, DayOfWeek::Tuesday, 12));
    }

    #[test]
    fn closed_spans_merge_contiguous_hours() {
        let open = [HourSpan::new(10, 12), HourSpan::new(14, 18)];
        assert_eq!(
            closed_spans(&open),
            vec![
                HourSpan::new(8, 10),
                HourSpan::new(12, 14),
                HourSpan::new(18, 20)
            ]
        );
        assert_eq!(closed_spans(&[HourSpan::new(8, 20)]), vec![]);
    }

    proptest! {
        /// Any sequence of accepted reservations leaves every (day, hour)
        /// cell covered by at most one real activity.
        #[test]
        fn no_double_booking(ops in proptest::collection::vec(
            (0u8..5, 8u8..19, 1u8..3), 0..60,
        )) {
            let tracker: ResourceTracker<RoomId> = ResourceTracker::new();
            let id: RoomId = "R1".into();
            for (day, start, len) in ops {
                let day = DayOfWeek::ALL[day as usize];
                let end = (start + len).min(20);
                let _ = tracker.try_reserve(&id, &activity("R1", day, start, end));
            }
            for day in DayOfWeek::ALL {
                for hour in 8..20u8 {
                    let covering = tracker
                        .activities_for(&id)
                        .into_iter()
                        .filter(|a| a.day == day && a.span.contains(hour) && !a.kind.is_placeholder())
                        .count();
                    prop_assert!(covering <= 1);
                }
            }
        }
    }
}
