use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCORE_MAX: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Laki-laki")]
    Male,
    #[serde(rename = "Perempuan")]
    Female,
}

impl Gender {
    /// Single-letter code used by paste imports: `L` or `P`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Gender::Male),
            "P" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Gender::Male, Gender::Female]
            .into_iter()
            .find(|g| g.label() == label)
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Laki-laki",
            Gender::Female => "Perempuan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn number(self) -> i64 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }
}

impl TryFrom<i64> for Semester {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Semester::First),
            2 => Ok(Semester::Second),
            other => Err(format!("semester must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Semester> for i64 {
    fn from(s: Semester) -> i64 {
        s.number()
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Integer score in 0..=100. Anything else fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub fn value(self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if (0..=SCORE_MAX).contains(&v) {
            Ok(Score(v as u8))
        } else {
            Err(format!("score must be between 0 and {}, got {}", SCORE_MAX, v))
        }
    }
}

impl From<Score> for i64 {
    fn from(s: Score) -> i64 {
        i64::from(s.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: String,
    /// Registration number (Nomor Induk).
    pub student_id: String,
    pub name: String,
    pub class: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeroomTeacher {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub student_id: String,
    pub subject: String,
    #[serde(default)]
    pub teacher_id: String,
    pub class: String,
    pub semester: Semester,
    pub score: Score,
}

impl Grade {
    pub fn same_key(&self, other: &Grade) -> bool {
        self.student_id == other.student_id
            && self.subject == other.subject
            && self.semester == other.semester
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub details: String,
}

/// One atomic capture of every master collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    pub students: Vec<Student>,
    pub teachers: Vec<Teacher>,
    pub homeroom_teachers: Vec<HomeroomTeacher>,
    pub subjects: Vec<String>,
    pub grades: Vec<Grade>,
}

impl DataSnapshot {
    pub fn student_by_registration(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn homeroom_for_class(&self, class: &str) -> Option<&HomeroomTeacher> {
        self.homeroom_teachers.iter().find(|h| h.class == class)
    }

    /// Distinct classes named by students or homeroom teachers, sorted.
    pub fn classes(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .students
            .iter()
            .map(|s| s.class.clone())
            .chain(self.homeroom_teachers.iter().map(|h| h.class.clone()))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rejects_out_of_range_json() {
        assert!(serde_json::from_value::<Score>(serde_json::json!(100)).is_ok());
        assert!(serde_json::from_value::<Score>(serde_json::json!(0)).is_ok());
        assert!(serde_json::from_value::<Score>(serde_json::json!(101)).is_err());
        assert!(serde_json::from_value::<Score>(serde_json::json!(-1)).is_err());
        assert!(serde_json::from_value::<Score>(serde_json::json!("90")).is_err());
    }

    #[test]
    fn semester_round_trips_as_number() {
        let s: Semester = serde_json::from_value(serde_json::json!(2)).expect("semester");
        assert_eq!(s, Semester::Second);
        assert_eq!(serde_json::to_value(s).expect("json"), serde_json::json!(2));
        assert!(serde_json::from_value::<Semester>(serde_json::json!(3)).is_err());
    }

    #[test]
    fn gender_labels_match_the_wire_names() {
        for g in [Gender::Male, Gender::Female] {
            assert_eq!(serde_json::to_value(g).expect("json"), g.label());
            assert_eq!(Gender::from_label(g.label()), Some(g));
        }
        assert_eq!(Gender::from_label("laki-laki"), None);
    }

    #[test]
    fn classes_merge_students_and_homerooms() {
        let snap = DataSnapshot {
            students: vec![Student {
                id: "S-1".into(),
                student_id: "001".into(),
                name: "Ahmad".into(),
                class: "2B".into(),
                gender: Gender::Male,
            }],
            homeroom_teachers: vec![
                HomeroomTeacher {
                    id: "HR-1".into(),
                    name: "Ustadz Ali".into(),
                    class: "1A".into(),
                    contact: String::new(),
                },
                HomeroomTeacher {
                    id: "HR-2".into(),
                    name: "Ustadzah Siti".into(),
                    class: "2B".into(),
                    contact: String::new(),
                },
            ],
            ..DataSnapshot::default()
        };
        assert_eq!(snap.classes(), vec!["1A".to_string(), "2B".to_string()]);
    }
}
