pub mod accounting;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use types::{
    Activity, ActivityKind, Catalog, GenerationParams, GenerationReport, Group, Place, Room,
    Subject, Teacher,
};

/// Catalog faults that abort a run before any subject is dispatched.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Sanity checks on the snapshot; any failure here is orchestrator-fatal.
/// Session-level infeasibility (a slot that cannot be found at run time)
/// is not an error and is reported as a shortfall instead.
pub fn validate(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut errors: Vec<String> = Vec::new();

    if catalog.subjects().next().is_none() {
        errors.push("subject catalog is empty".into());
    }

    for subject in catalog.subjects() {
        let kinds = [
            ("course", subject.courses_per_week > 0, subject.course_len),
            ("seminar", subject.seminars_per_week > 0, subject.seminar_len),
            (
                "laboratory",
                subject.laboratories_per_week > 0.0,
                subject.laboratory_len,
            ),
        ];
        for (label, wanted, len) in kinds {
            if wanted && !(1..=11).contains(&len) {
                errors.push(format!(
                    "subject {} has invalid {label} session length {len}",
                    subject.id
                ));
            }
        }
    }

    for group in catalog.groups() {
        if group.size == 0 {
            errors.push(format!("group {} has size 0", group.id));
        }
        if group.seminar_split == 0 || group.laboratory_split == 0 {
            errors.push(format!("group {} has a zero split factor", group.id));
        }
        for subject in &group.subjects {
            if catalog.subject(subject).is_none() {
                errors.push(format!(
                    "group {} references missing subject {subject}",
                    group.id
                ));
            }
        }
    }

    for entry in catalog.rooms() {
        if entry.room.capacity == 0 {
            errors.push(format!("room {} has capacity 0", entry.room.id));
        }
    }

    // Per-subject room feasibility, against the kinds the subject needs.
    for subject in catalog.subjects() {
        let groups = catalog.groups_for(&subject.id);
        if groups.is_empty() {
            continue;
        }
        if subject.course_hours() > 0 {
            let total: u32 = groups
                .iter()
                .filter_map(|id| catalog.group(id))
                .map(|g| g.size)
                .sum();
            if catalog
                .eligible_rooms(ActivityKind::Course, total)
                .next()
                .is_none()
            {
                errors.push(format!(
                    "subject {} is unschedulable: no course room seats {total}",
                    subject.id
                ));
            }
        }
        for group in groups.iter().filter_map(|id| catalog.group(id)) {
            if subject.seminar_hours() > 0
                && catalog
                    .eligible_rooms(ActivityKind::Seminar, group.seminar_subgroup_size())
                    .next()
                    .is_none()
            {
                errors.push(format!(
                    "subject {} is unschedulable: no seminar room for group {}",
                    subject.id, group.id
                ));
            }
            if subject.laboratory_hours() > 0
                && catalog
                    .eligible_rooms(ActivityKind::Laboratory, group.laboratory_subgroup_size())
                    .next()
                    .is_none()
            {
                errors.push(format!(
                    "subject {} is unschedulable: no laboratory room for group {}",
                    subject.id, group.id
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Invalid(errors.join("; ")))
    }
}

/// Seam between callers and the generation engine. The caller always
/// receives a report under non-fatal conditions; success is judged from
/// the aggregate rate and error list, not from the `Result`.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(
        &self,
        catalog: Arc<Catalog>,
        params: GenerationParams,
    ) -> anyhow::Result<GenerationReport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::SubjectCapability;

    fn subject(id: &str, courses: u32, course_len: u32) -> Subject {
        Subject {
            id: id.into(),
            language: None,
            courses_per_week: courses,
            course_len,
            seminars_per_week: 0,
            seminar_len: 0,
            laboratories_per_week: 0.0,
            laboratory_len: 0,
        }
    }

    fn group(id: &str, size: u32, subjects: &[&str]) -> Group {
        Group {
            id: id.into(),
            size,
            language: None,
            subjects: subjects.iter().map(|s| (*s).into()).collect(),
            seminar_split: 1,
            laboratory_split: 1,
        }
    }

    fn teacher(id: &str, subjects: &[&str]) -> Teacher {
        Teacher {
            id: id.into(),
            busy: Default::default(),
            max_hours_per_week: 20,
            preferred_buildings: vec![],
            languages: vec![],
            subjects: subjects
                .iter()
                .map(|s| {
                    (
                        (*s).into(),
                        SubjectCapability {
                            course: true,
                            seminar: true,
                            laboratory: true,
                        },
                    )
                })
                .collect(),
        }
    }

    fn place(rooms: Vec<Room>) -> Place {
        Place {
            id: "Main".into(),
            schedule: Default::default(),
            rooms,
        }
    }

    fn room(id: &str, capacity: u32) -> Room {
        Room {
            id: id.into(),
            capacity,
            no_course: false,
            no_seminar: false,
            no_laboratory: false,
        }
    }

    #[test]
    fn valid_catalog_passes() {
        let catalog = Catalog::new(
            vec![subject("Algebra", 1, 2)],
            vec![teacher("Smith", &["Algebra"])],
            vec![group("G1", 25, &["Algebra"])],
            vec![place(vec![room("R30", 30)])],
        );
        assert!(validate(&catalog).is_ok());
    }

    #[test]
    fn missing_subject_reference_is_fatal() {
        let catalog = Catalog::new(
            vec![subject("Algebra", 1, 2)],
            vec![teacher("Smith", &["Algebra"])],
            vec![group("G1", 25, &["Algebra", "Ghost"])],
            vec![place(vec![room("R30", 30)])],
        );
        let err = validate(&catalog).unwrap_err();
        assert!(err.to_string().contains("missing subject Ghost"));
    }

    #[test]
    fn zero_split_factor_is_fatal() {
        let mut g = group("G1", 25, &["Algebra"]);
        g.seminar_split = 0;
        let catalog = Catalog::new(
            vec![subject("Algebra", 1, 2)],
            vec![teacher("Smith", &["Algebra"])],
            vec![g],
            vec![place(vec![room("R30", 30)])],
        );
        assert!(validate(&catalog).is_err());
    }

    #[test]
    fn undersized_rooms_are_fatal_for_enrolled_subjects() {
        let catalog = Catalog::new(
            vec![subject("Algebra", 1, 2)],
            vec![teacher("Smith", &["Algebra"])],
            vec![group("G1", 100, &["Algebra"])],
            vec![place(vec![room("R30", 30)])],
        );
        let err = validate(&catalog).unwrap_err();
        assert!(err.to_string().contains("no course room seats 100"));
    }

    #[test]
    fn subject_without_groups_needs_no_rooms() {
        let catalog = Catalog::new(
            vec![subject("Algebra", 1, 2)],
            vec![teacher("Smith", &["Algebra"])],
            vec![group("G1", 100, &[])],
            vec![place(vec![])],
        );
        assert!(validate(&catalog).is_ok());
        assert!(catalog.groups_for(&"Algebra".into()).is_empty());
    }
}
