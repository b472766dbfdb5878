pub mod catalog;
pub mod report;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use catalog::Catalog;
pub use report::{GenerationMetrics, GenerationReport, Phase, SubjectOutcome};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}
id_newtype!(SubjectId);
id_newtype!(TeacherId);
id_newtype!(GroupId);
id_newtype!(RoomId);
id_newtype!(PlaceId);

impl GroupId {
    /// Sentinel group id carried by a shared course session attended by
    /// every enrolled group at once.
    pub fn all_groups() -> Self {
        Self("ALL_GROUPS".to_owned())
    }

    pub fn is_all_groups(&self) -> bool {
        self.0 == "ALL_GROUPS"
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    pub fn index(self) -> usize {
        match self {
            DayOfWeek::Monday => 0,
            DayOfWeek::Tuesday => 1,
            DayOfWeek::Wednesday => 2,
            DayOfWeek::Thursday => 3,
            DayOfWeek::Friday => 4,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
        };
        f.write_str(s)
    }
}

/// Whole-hour span within a day, `[start, end)`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct HourSpan {
    pub start: u8,
    pub end: u8,
}

impl HourSpan {
    pub fn new(start: u8, end: u8) -> Self {
        debug_assert!(end > start, "hour span must be non-empty");
        Self { start, end }
    }

    pub fn hours(&self) -> u32 {
        u32::from(self.end.saturating_sub(self.start))
    }

    pub fn contains(&self, hour: u8) -> bool {
        hour >= self.start && hour < self.end
    }
}

impl fmt::Display for HourSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Course,
    Seminar,
    Laboratory,
    /// Externally imposed teacher unavailability, seeded at tracker construction.
    Busy,
    /// Room outside its place's operating hours, seeded at tracker construction.
    Closed,
}

impl ActivityKind {
    pub fn is_placeholder(self) -> bool {
        matches!(self, ActivityKind::Busy | ActivityKind::Closed)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::Course => "COURSE",
            ActivityKind::Seminar => "SEMINAR",
            ActivityKind::Laboratory => "LABORATORY",
            ActivityKind::Busy => "BUSY",
            ActivityKind::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Frequency {
    #[default]
    Weekly,
    EveryOtherWeek,
}

/// One scheduled occurrence of a course, seminar or laboratory. Immutable
/// once created; a shared course session appears once, attributed to the
/// `ALL_GROUPS` sentinel rather than once per enrolled group.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub subject: SubjectId,
    pub group: GroupId,
    pub teacher: TeacherId,
    pub room: RoomId,
    pub day: DayOfWeek,
    pub span: HourSpan,
    pub kind: ActivityKind,
    #[serde(default)]
    pub subgroup: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
}

impl Activity {
    pub fn duration_hours(&self) -> u32 {
        self.span.hours()
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} ({}) | {} | Group: {} | Teacher: {} | Room: {}",
            self.day, self.span, self.kind, self.subject, self.group, self.teacher, self.room
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SubjectCapability {
    #[serde(default)]
    pub course: bool,
    #[serde(default)]
    pub seminar: bool,
    #[serde(default)]
    pub laboratory: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub courses_per_week: u32,
    #[serde(default)]
    pub course_len: u32,
    #[serde(default)]
    pub seminars_per_week: u32,
    #[serde(default)]
    pub seminar_len: u32,
    /// Fractional counts mean every-other-week sessions (e.g. 0.5).
    #[serde(default)]
    pub laboratories_per_week: f64,
    #[serde(default)]
    pub laboratory_len: u32,
}

impl Subject {
    pub fn course_hours(&self) -> u32 {
        self.courses_per_week * self.course_len
    }

    pub fn seminar_hours(&self) -> u32 {
        self.seminars_per_week * self.seminar_len
    }

    pub fn laboratory_hours(&self) -> u32 {
        (self.laboratories_per_week * f64::from(self.laboratory_len)).ceil() as u32
    }

    pub fn weekly_hours(&self) -> u32 {
        self.course_hours() + self.seminar_hours() + self.laboratory_hours()
    }

    pub fn laboratory_frequency(&self) -> Frequency {
        if self.laboratories_per_week.fract() != 0.0 {
            Frequency::EveryOtherWeek
        } else {
            Frequency::Weekly
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub size: u32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
    #[serde(default = "one")]
    pub seminar_split: u32,
    #[serde(default = "one")]
    pub laboratory_split: u32,
}

fn one() -> u32 {
    1
}

impl Group {
    pub fn takes(&self, subject: &SubjectId) -> bool {
        self.subjects.contains(subject)
    }

    pub fn seminar_subgroup_size(&self) -> u32 {
        self.size / self.seminar_split.max(1)
    }

    pub fn laboratory_subgroup_size(&self) -> u32 {
        self.size / self.laboratory_split.max(1)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    /// Pre-existing busy windows, keyed by day.
    #[serde(default)]
    pub busy: HashMap<DayOfWeek, Vec<HourSpan>>,
    #[serde(default)]
    pub max_hours_per_week: u32,
    #[serde(default)]
    pub preferred_buildings: Vec<PlaceId>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub subjects: HashMap<SubjectId, SubjectCapability>,
}

impl Teacher {
    pub fn teaches(&self, subject: &SubjectId) -> bool {
        self.subjects.contains_key(subject)
    }

    pub fn can_teach(&self, subject: &SubjectId, kind: ActivityKind) -> bool {
        let Some(cap) = self.subjects.get(subject) else {
            return false;
        };
        match kind {
            ActivityKind::Course => cap.course,
            ActivityKind::Seminar => cap.seminar,
            ActivityKind::Laboratory => cap.laboratory,
            _ => false,
        }
    }
}

/// Which activity kinds a room may host, derived from its exclusion flags.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum RoomCapability {
    CourseOnly,
    SeminarOnly,
    LabOnly,
    CourseSeminar,
    CourseLab,
    SeminarLab,
    All,
}

impl RoomCapability {
    pub fn from_exclusions(no_course: bool, no_seminar: bool, no_laboratory: bool) -> Option<Self> {
        match (!no_course, !no_seminar, !no_laboratory) {
            (true, true, true) => Some(RoomCapability::All),
            (true, true, false) => Some(RoomCapability::CourseSeminar),
            (true, false, true) => Some(RoomCapability::CourseLab),
            (false, true, true) => Some(RoomCapability::SeminarLab),
            (true, false, false) => Some(RoomCapability::CourseOnly),
            (false, true, false) => Some(RoomCapability::SeminarOnly),
            (false, false, true) => Some(RoomCapability::LabOnly),
            (false, false, false) => None,
        }
    }

    pub fn permits(self, kind: ActivityKind) -> bool {
        match kind {
            ActivityKind::Course => matches!(
                self,
                RoomCapability::All
                    | RoomCapability::CourseOnly
                    | RoomCapability::CourseSeminar
                    | RoomCapability::CourseLab
            ),
            ActivityKind::Seminar => matches!(
                self,
                RoomCapability::All
                    | RoomCapability::SeminarOnly
                    | RoomCapability::CourseSeminar
                    | RoomCapability::SeminarLab
            ),
            ActivityKind::Laboratory => matches!(
                self,
                RoomCapability::All
                    | RoomCapability::LabOnly
                    | RoomCapability::CourseLab
                    | RoomCapability::SeminarLab
            ),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default)]
    pub no_course: bool,
    #[serde(default)]
    pub no_seminar: bool,
    #[serde(default)]
    pub no_laboratory: bool,
}

impl Room {
    pub fn capability(&self) -> Option<RoomCapability> {
        RoomCapability::from_exclusions(self.no_course, self.no_seminar, self.no_laboratory)
    }

    pub fn permits(&self, kind: ActivityKind) -> bool {
        self.capability().is_some_and(|c| c.permits(kind))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    /// Operating hours per day; hours outside these windows are closed.
    #[serde(default)]
    pub schedule: HashMap<DayOfWeek, Vec<HourSpan>>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Explicit RNG seed for deterministic replay; `None` draws a fresh
    /// seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Worker-pool size override; defaults to available hardware
    /// parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_span_duration_and_containment() {
        let span = HourSpan::new(8, 10);
        assert_eq!(span.hours(), 2);
        assert!(span.contains(8));
        assert!(span.contains(9));
        assert!(!span.contains(10));
    }

    #[test]
    fn activity_renders_stable_line() {
        let a = Activity {
            subject: "Algebra".into(),
            group: "G1".into(),
            teacher: "Smith".into(),
            room: "R101".into(),
            day: DayOfWeek::Monday,
            span: HourSpan::new(8, 10),
            kind: ActivityKind::Course,
            subgroup: None,
            frequency: Frequency::Weekly,
        };
        assert_eq!(
            a.to_string(),
            "MONDAY | 08:00-10:00 (COURSE) | Algebra | Group: G1 | Teacher: Smith | Room: R101"
        );
    }

    #[test]
    fn room_capability_covers_all_seven_categories() {
        use RoomCapability::*;
        let cases = [
            (false, false, false, Some(All)),
            (false, false, true, Some(CourseSeminar)),
            (false, true, false, Some(CourseLab)),
            (true, false, false, Some(SeminarLab)),
            (false, true, true, Some(CourseOnly)),
            (true, false, true, Some(SeminarOnly)),
            (true, true, false, Some(LabOnly)),
            (true, true, true, None),
        ];
        for (nc, ns, nl, expect) in cases {
            assert_eq!(RoomCapability::from_exclusions(nc, ns, nl), expect);
        }
        assert!(All.permits(ActivityKind::Laboratory));
        assert!(!CourseOnly.permits(ActivityKind::Seminar));
        assert!(!SeminarLab.permits(ActivityKind::Course));
        assert!(!All.permits(ActivityKind::Busy));
    }

    #[test]
    fn subgroup_sizes_divide_by_split() {
        let g = Group {
            id: "G1".into(),
            size: 30,
            language: None,
            subjects: vec![],
            seminar_split: 2,
            laboratory_split: 3,
        };
        assert_eq!(g.seminar_subgroup_size(), 15);
        assert_eq!(g.laboratory_subgroup_size(), 10);
    }

    #[test]
    fn fractional_laboratory_counts_round_up() {
        let s = Subject {
            id: "Physics".into(),
            language: None,
            courses_per_week: 1,
            course_len: 2,
            seminars_per_week: 1,
            seminar_len: 1,
            laboratories_per_week: 0.5,
            laboratory_len: 2,
        };
        assert_eq!(s.laboratory_hours(), 1);
        assert_eq!(s.weekly_hours(), 4);
        assert_eq!(s.laboratory_frequency(), Frequency::EveryOtherWeek);
    }
}
