//! Immutable, pre-indexed snapshot of the subject/teacher/group/room
//! catalogs. Built once before a generation run and passed by reference
//! to the orchestrator and every subject scheduler.

use crate::{
    ActivityKind, Group, GroupId, Place, PlaceId, Room, RoomId, Subject, SubjectId, Teacher,
    TeacherId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A room together with the place (building) that owns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomEntry {
    pub place: PlaceId,
    pub room: Room,
}

// Deliberately not `Deserialize`: the derived indices must go through
// `Catalog::new`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Catalog {
    subjects: BTreeMap<SubjectId, Subject>,
    teachers: BTreeMap<TeacherId, Teacher>,
    groups: BTreeMap<GroupId, Group>,
    places: BTreeMap<PlaceId, Place>,

    /// All rooms, sorted ascending by capacity (stable, so catalog order
    /// breaks ties). Best-fit selection walks this in order.
    #[serde(skip)]
    rooms: Vec<RoomEntry>,
    /// Indices into `rooms` per hostable activity kind.
    #[serde(skip)]
    rooms_by_kind: [Vec<usize>; 3],
    #[serde(skip)]
    groups_by_subject: HashMap<SubjectId, Vec<GroupId>>,
    #[serde(skip)]
    teachers_by_subject: HashMap<SubjectId, Vec<TeacherId>>,
}

impl Catalog {
    pub fn new(
        subjects: Vec<Subject>,
        teachers: Vec<Teacher>,
        groups: Vec<Group>,
        places: Vec<Place>,
    ) -> Self {
        let mut catalog = Catalog {
            subjects: subjects.into_iter().map(|s| (s.id.clone(), s)).collect(),
            teachers: teachers.into_iter().map(|t| (t.id.clone(), t)).collect(),
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            places: places.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Catalog::default()
        };
        catalog.build_indices();
        catalog
    }

    fn build_indices(&mut self) {
        let mut rooms: Vec<RoomEntry> = self
            .places
            .values()
            .flat_map(|place| {
                place.rooms.iter().map(|room| RoomEntry {
                    place: place.id.clone(),
                    room: room.clone(),
                })
            })
            .collect();
        rooms.sort_by_key(|entry| entry.room.capacity);

        let mut rooms_by_kind: [Vec<usize>; 3] = Default::default();
        for (i, entry) in rooms.iter().enumerate() {
            for (slot, kind) in [
                ActivityKind::Course,
                ActivityKind::Seminar,
                ActivityKind::Laboratory,
            ]
            .into_iter()
            .enumerate()
            {
                if entry.room.permits(kind) {
                    rooms_by_kind[slot].push(i);
                }
            }
        }

        let mut groups_by_subject: HashMap<SubjectId, Vec<GroupId>> = HashMap::new();
        for group in self.groups.values() {
            for subject in &group.subjects {
                groups_by_subject
                    .entry(subject.clone())
                    .or_default()
                    .push(group.id.clone());
            }
        }

        let mut teachers_by_subject: HashMap<SubjectId, Vec<TeacherId>> = HashMap::new();
        for teacher in self.teachers.values() {
            for subject in teacher.subjects.keys() {
                teachers_by_subject
                    .entry(subject.clone())
                    .or_default()
                    .push(teacher.id.clone());
            }
        }

        self.rooms = rooms;
        self.rooms_by_kind = rooms_by_kind;
        self.groups_by_subject = groups_by_subject;
        self.teachers_by_subject = teachers_by_subject;
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn subject(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    pub fn teachers(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values()
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn rooms(&self) -> &[RoomEntry] {
        &self.rooms
    }

    pub fn room(&self, id: &RoomId) -> Option<&RoomEntry> {
        self.rooms.iter().find(|entry| &entry.room.id == id)
    }

    /// Groups whose subject list contains `subject`.
    pub fn groups_for(&self, subject: &SubjectId) -> &[GroupId] {
        self.groups_by_subject
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Teachers qualified for `subject`, before any per-kind filtering.
    pub fn teachers_for(&self, subject: &SubjectId) -> &[TeacherId] {
        self.teachers_by_subject
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rooms that may host `kind` and seat at least `min_capacity`,
    /// smallest first.
    pub fn eligible_rooms(
        &self,
        kind: ActivityKind,
        min_capacity: u32,
    ) -> impl Iterator<Item = &RoomEntry> {
        let indices: &[usize] = match kind {
            ActivityKind::Course => &self.rooms_by_kind[0],
            ActivityKind::Seminar => &self.rooms_by_kind[1],
            ActivityKind::Laboratory => &self.rooms_by_kind[2],
            _ => &[],
        };
        indices
            .iter()
            .map(|&i| &self.rooms[i])
            .filter(move |entry| entry.room.capacity >= min_capacity)
    }
}
