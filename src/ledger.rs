use crate::model::{DataSnapshot, Grade, Semester, Student};
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_AVERAGE_DECIMALS: usize = 2;

/// Qualitative band for an average. Lower bounds are inclusive and checked
/// top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Predicate {
    Mumtaz,
    #[serde(rename = "Jayyid Jiddan")]
    JayyidJiddan,
    Jayyid,
    Hasan,
    Maqbul,
    Rosib,
}

impl Predicate {
    pub fn from_average(average: f64) -> Self {
        if average >= 85.0 {
            Predicate::Mumtaz
        } else if average >= 75.0 {
            Predicate::JayyidJiddan
        } else if average >= 65.0 {
            Predicate::Jayyid
        } else if average >= 50.0 {
            Predicate::Hasan
        } else if average >= 40.0 {
            Predicate::Maqbul
        } else {
            Predicate::Rosib
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Predicate::Mumtaz => "Mumtaz",
            Predicate::JayyidJiddan => "Jayyid Jiddan",
            Predicate::Jayyid => "Jayyid",
            Predicate::Hasan => "Hasan",
            Predicate::Maqbul => "Maqbul",
            Predicate::Rosib => "Rosib",
        }
    }
}

pub fn format_average(average: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, average)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub student_id: String,
    pub student_name: String,
    pub scores: BTreeMap<String, u32>,
    /// Ledger subjects this student has no grade for. They count as 0.
    pub missing_subjects: Vec<String>,
    pub total: u32,
    pub average: f64,
    pub rank: usize,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub class: String,
    pub semester: Semester,
    pub subjects: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

fn ledger_row(student: &Student, grades: &[&Grade], subjects: &[String]) -> LedgerRow {
    let own: Vec<&Grade> = grades
        .iter()
        .copied()
        .filter(|g| g.student_id == student.student_id)
        .collect();

    let mut scores = BTreeMap::new();
    let mut missing_subjects = Vec::new();
    for subject in subjects {
        let score = match own.iter().find(|g| g.subject == *subject) {
            Some(g) => g.score.value(),
            None => {
                missing_subjects.push(subject.clone());
                0
            }
        };
        scores.insert(subject.clone(), score);
    }

    let total: u32 = scores.values().sum();
    // Divisor is the column count, not the number of grades the student has.
    let average = if own.is_empty() || subjects.is_empty() {
        0.0
    } else {
        f64::from(total) / subjects.len() as f64
    };

    LedgerRow {
        student_id: student.student_id.clone(),
        student_name: student.name.clone(),
        scores,
        missing_subjects,
        total,
        average,
        rank: 0,
        predicate: Predicate::from_average(average),
    }
}

pub fn build_ledger(snapshot: &DataSnapshot, class: &str, semester: Semester) -> Ledger {
    let grades: Vec<&Grade> = snapshot
        .grades
        .iter()
        .filter(|g| g.class == class && g.semester == semester)
        .collect();
    let subjects: Vec<String> = grades
        .iter()
        .map(|g| g.subject.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rows: Vec<LedgerRow> = snapshot
        .students
        .iter()
        .filter(|s| s.class == class)
        .map(|s| ledger_row(s, &grades, &subjects))
        .collect();

    // Stable sort: equal totals keep roster order and take sequential ranks.
    let mut by_total: Vec<usize> = (0..rows.len()).collect();
    by_total.sort_by(|&a, &b| rows[b].total.cmp(&rows[a].total));
    for (pos, idx) in by_total.into_iter().enumerate() {
        rows[idx].rank = pos + 1;
    }

    rows.sort_by(|a, b| a.student_name.cmp(&b.student_name));

    Ledger {
        class: class.to_string(),
        semester,
        subjects,
        rows,
    }
}

impl Ledger {
    pub fn to_table(&self, decimals: usize) -> Table {
        let mut columns: Vec<String> = vec!["No".into(), "Student ID".into(), "Name".into()];
        columns.extend(self.subjects.iter().cloned());
        columns.extend(
            ["Total", "Average", "Rank", "Predicate"]
                .iter()
                .map(|s| s.to_string()),
        );

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut cells = vec![
                    (i + 1).to_string(),
                    r.student_id.clone(),
                    r.student_name.clone(),
                ];
                cells.extend(
                    self.subjects
                        .iter()
                        .map(|s| r.scores.get(s).copied().unwrap_or(0).to_string()),
                );
                cells.push(r.total.to_string());
                cells.push(format_average(r.average, decimals));
                cells.push(r.rank.to_string());
                cells.push(r.predicate.label().to_string());
                cells
            })
            .collect();

        Table { columns, rows }
    }
}
