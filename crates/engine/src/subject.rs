//! Per-subject scheduling: computes and reserves every course, seminar
//! and laboratory session one subject needs across its enrolled groups,
//! against the shared trackers.

use crate::search::{SlotStrategy, TwoPhaseSearch};
use crate::tracker::Trackers;
use gen_core::accounting;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use types::{
    Activity, ActivityKind, Catalog, DayOfWeek, Frequency, Group, GroupId, HourSpan, RoomId,
    Subject, Teacher, TeacherId,
};

pub struct SubjectScheduler<'a, S = TwoPhaseSearch> {
    subject: &'a Subject,
    catalog: &'a Catalog,
    trackers: &'a Trackers,
    rng: ChaCha8Rng,
    strategy: S,
    scheduled: Vec<Activity>,
}

impl<'a> SubjectScheduler<'a, TwoPhaseSearch> {
    pub fn new(subject: &'a Subject, catalog: &'a Catalog, trackers: &'a Trackers, seed: u64) -> Self {
        Self::with_strategy(
            subject,
            catalog,
            trackers,
            seed,
            TwoPhaseSearch::new(seed ^ 0x9E37_79B9_7F4A_7C15),
        )
    }
}

impl<'a, S: SlotStrategy> SubjectScheduler<'a, S> {
    pub fn with_strategy(
        subject: &'a Subject,
        catalog: &'a Catalog,
        trackers: &'a Trackers,
        seed: u64,
        strategy: S,
    ) -> Self {
        Self {
            subject,
            catalog,
            trackers,
            rng: ChaCha8Rng::seed_from_u64(seed),
            strategy,
            scheduled: Vec::new(),
        }
    }

    /// Schedule everything the subject requires. Unplaceable sessions are
    /// shortfalls, not errors; the returned list holds what succeeded.
    pub fn run(mut self) -> Vec<Activity> {
        let catalog = self.catalog;
        let groups: Vec<&Group> = catalog
            .groups_for(&self.subject.id)
            .iter()
            .filter_map(|id| catalog.group(id))
            .collect();
        if groups.is_empty() {
            debug!(subject = %self.subject.id, "no enrolled groups");
            return self.scheduled;
        }

        let qualified: Vec<&Teacher> = catalog
            .teachers_for(&self.subject.id)
            .iter()
            .filter_map(|id| catalog.teacher(id))
            .collect();
        if qualified.is_empty() {
            warn!(subject = %self.subject.id, "no qualified teachers");
            return self.scheduled;
        }

        let courses_ok = self.schedule_courses(&groups, &qualified);
        let seminars_ok = self.schedule_split_kind(ActivityKind::Seminar, &groups, &qualified);
        let labs_ok = self.schedule_split_kind(ActivityKind::Laboratory, &groups, &qualified);
        for (ok, label) in [
            (courses_ok, "courses"),
            (seminars_ok, "seminars"),
            (labs_ok, "laboratories"),
        ] {
            if !ok {
                warn!(subject = %self.subject.id, "failed to schedule {label} completely");
            }
        }
        self.scheduled
    }

    /// Courses are shared: one teacher, one room and one slot serve every
    /// enrolled group simultaneously.
    fn schedule_courses(&mut self, groups: &[&Group], teachers: &[&Teacher]) -> bool {
        let subject = self.subject;
        let sessions = accounting::session_count(subject.course_hours(), subject.course_len);
        if sessions == 0 {
            return true;
        }
        let len = subject.course_len as u8;
        let total_size: u32 = groups.iter().map(|g| g.size).sum();
        let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id.clone()).collect();

        let mut all_placed = true;
        for _ in 0..sessions {
            let teacher = teachers[self.rng.gen_range(0..teachers.len())];
            let (catalog, trackers, subject_id) = (self.catalog, self.trackers, &subject.id);
            let teacher_id = &teacher.id;
            let group_ids = &group_ids;
            let mut placed = None;
            self.strategy.find_slot(len, &mut |day, start| {
                let span = HourSpan::new(start, start + len);
                match try_place_course(
                    trackers, catalog, subject_id, teacher_id, group_ids, total_size, day, span,
                ) {
                    Some(activity) => {
                        placed = Some(activity);
                        true
                    }
                    None => false,
                }
            });
            match placed {
                Some(activity) => self.scheduled.push(activity),
                None => all_placed = false,
            }
        }
        all_placed
    }

    /// Seminars and laboratories: each enrolled group splits into
    /// subgroups, each subgroup scheduled independently with its own
    /// teacher, room and slot.
    fn schedule_split_kind(
        &mut self,
        kind: ActivityKind,
        groups: &[&Group],
        teachers: &[&Teacher],
    ) -> bool {
        let subject = self.subject;
        let (sessions, len, frequency) = match kind {
            ActivityKind::Seminar => (
                accounting::session_count(subject.seminar_hours(), subject.seminar_len),
                subject.seminar_len,
                Frequency::Weekly,
            ),
            ActivityKind::Laboratory => (
                accounting::laboratory_session_count(
                    subject.laboratory_hours(),
                    subject.laboratory_len,
                ),
                subject.laboratory_len,
                subject.laboratory_frequency(),
            ),
            _ => return true,
        };
        if sessions == 0 || len == 0 {
            return true;
        }

        let kind_teachers: Vec<&Teacher> = teachers
            .iter()
            .copied()
            .filter(|t| t.can_teach(&subject.id, kind))
            .collect();
        if kind_teachers.is_empty() {
            warn!(subject = %subject.id, %kind, "no teacher holds the capability flag");
            return false;
        }

        let len = len as u8;
        let mut all_placed = true;
        for group in groups {
            let (split, capacity) = match kind {
                ActivityKind::Seminar => (group.seminar_split.max(1), group.seminar_subgroup_size()),
                _ => (
                    group.laboratory_split.max(1),
                    group.laboratory_subgroup_size(),
                ),
            };
            for part in 1..=split {
                let subgroup = (split > 1).then(|| format!("{part}/{split}"));
                for _ in 0..sessions {
                    let teacher = kind_teachers[self.rng.gen_range(0..kind_teachers.len())];
                    let (catalog, trackers, subject_id) = (self.catalog, self.trackers, &subject.id);
                    let (teacher_id, group_id, subgroup) = (&teacher.id, &group.id, &subgroup);
                    let mut placed = None;
                    self.strategy.find_slot(len, &mut |day, start| {
                        let span = HourSpan::new(start, start + len);
                        match try_place_subgroup(
                            trackers, catalog, subject_id, teacher_id, group_id, capacity, kind,
                            subgroup, frequency, day, span,
                        ) {
                            Some(activity) => {
                                placed = Some(activity);
                                true
                            }
                            None => false,
                        }
                    });
                    match placed {
                        Some(activity) => self.scheduled.push(activity),
                        None => all_placed = false,
                    }
                }
            }
        }
        all_placed
    }
}

/// Room capacity must fit the sum of all enrolled groups; the session
/// blocks every group's calendar all-or-nothing and is recorded once
/// under the all-groups sentinel.
#[allow(clippy::too_many_arguments)]
fn try_place_course(
    trackers: &Trackers,
    catalog: &Catalog,
    subject: &types::SubjectId,
    teacher: &TeacherId,
    groups: &[GroupId],
    total_size: u32,
    day: DayOfWeek,
    span: HourSpan,
) -> Option<Activity> {
    let candidates: Vec<RoomId> = catalog
        .eligible_rooms(ActivityKind::Course, total_size)
        .map(|entry| entry.room.id.clone())
        .collect();
    let make = |room: &RoomId| Activity {
        subject: subject.clone(),
        group: GroupId::all_groups(),
        teacher: teacher.clone(),
        room: room.clone(),
        day,
        span,
        kind: ActivityKind::Course,
        subgroup: None,
        frequency: Frequency::Weekly,
    };

    let room = trackers.rooms.try_reserve_first(&candidates, day, span, make)?;
    let activity = make(&room);
    if !trackers.teachers.try_reserve(teacher, &activity) {
        trackers.rooms.release(&room, &activity);
        return None;
    }
    if !trackers.groups.try_reserve_all(groups, &activity) {
        trackers.teachers.release(teacher, &activity);
        trackers.rooms.release(&room, &activity);
        return None;
    }
    Some(activity)
}

#[allow(clippy::too_many_arguments)]
fn try_place_subgroup(
    trackers: &Trackers,
    catalog: &Catalog,
    subject: &types::SubjectId,
    teacher: &TeacherId,
    group: &GroupId,
    capacity: u32,
    kind: ActivityKind,
    subgroup: &Option<String>,
    frequency: Frequency,
    day: DayOfWeek,
    span: HourSpan,
) -> Option<Activity> {
    let candidates: Vec<RoomId> = catalog
        .eligible_rooms(kind, capacity)
        .map(|entry| entry.room.id.clone())
        .collect();
    let make = |room: &RoomId| Activity {
        subject: subject.clone(),
        group: group.clone(),
        teacher: teacher.clone(),
        room: room.clone(),
        day,
        span,
        kind,
        subgroup: subgroup.clone(),
        frequency,
    };

    let room = trackers.rooms.try_reserve_first(&candidates, day, span, make)?;
    let activity = make(&room);
    if !trackers.teachers.try_reserve(teacher, &activity) {
        trackers.rooms.release(&room, &activity);
        return None;
    }
    if !trackers.groups.try_reserve(group, &activity) {
        trackers.teachers.release(teacher, &activity);
        trackers.rooms.release(&room, &activity);
        return None;
    }
    Some(activity)
}
