use crate::ledger::{format_average, Predicate};
use crate::model::{DataSnapshot, Grade, HomeroomTeacher, Semester, Student};
use crate::table::Table;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_teachers: usize,
    pub grades_entered: usize,
    pub average_grade: Option<f64>,
}

pub fn dashboard(snapshot: &DataSnapshot) -> DashboardStats {
    let grades_entered = snapshot.grades.len();
    let average_grade = if grades_entered == 0 {
        None
    } else {
        let total: u32 = snapshot.grades.iter().map(|g| g.score.value()).sum();
        Some(f64::from(total) / grades_entered as f64)
    };
    DashboardStats {
        total_students: snapshot.students.len(),
        total_teachers: snapshot.teachers.len(),
        grades_entered,
        average_grade,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub class: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<Semester>,
}

impl SummaryFilter {
    fn matches(&self, g: &Grade) -> bool {
        self.class.as_ref().map_or(true, |c| g.class == *c)
            && self.subject.as_ref().map_or(true, |s| g.subject == *s)
            && self.semester.map_or(true, |s| g.semester == s)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub student_id: String,
    pub student_name: Option<String>,
    pub class: String,
    pub subject: String,
    pub semester: Semester,
    pub score: u32,
    pub teacher_name: Option<String>,
}

/// Grades matching `filter`, ordered by student name.
pub fn grade_summary(snapshot: &DataSnapshot, filter: &SummaryFilter) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = snapshot
        .grades
        .iter()
        .filter(|g| filter.matches(g))
        .map(|g| SummaryRow {
            student_id: g.student_id.clone(),
            student_name: snapshot
                .student_by_registration(&g.student_id)
                .map(|s| s.name.clone()),
            class: g.class.clone(),
            subject: g.subject.clone(),
            semester: g.semester,
            score: g.score.value(),
            teacher_name: snapshot.teacher(&g.teacher_id).map(|t| t.name.clone()),
        })
        .collect();
    rows.sort_by(|a, b| {
        let an = a.student_name.as_deref().unwrap_or("");
        let bn = b.student_name.as_deref().unwrap_or("");
        an.cmp(bn)
    });
    rows
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCardLine {
    pub subject: String,
    pub score: u32,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCard {
    pub student: Student,
    pub semester: Semester,
    pub homeroom_teacher: Option<HomeroomTeacher>,
    pub lines: Vec<ReportCardLine>,
    pub total: u32,
    pub average: f64,
    pub predicate: Predicate,
}

/// A single student's card. Unlike the ledger, the average only covers the
/// grades the student actually has.
pub fn report_card(snapshot: &DataSnapshot, student: &Student, semester: Semester) -> ReportCard {
    let mut grades: Vec<&Grade> = snapshot
        .grades
        .iter()
        .filter(|g| g.student_id == student.student_id && g.semester == semester)
        .collect();
    grades.sort_by(|a, b| a.subject.cmp(&b.subject));

    let lines: Vec<ReportCardLine> = grades
        .iter()
        .map(|g| ReportCardLine {
            subject: g.subject.clone(),
            score: g.score.value(),
            predicate: Predicate::from_average(f64::from(g.score.value())),
        })
        .collect();
    let total: u32 = lines.iter().map(|l| l.score).sum();
    let average = if lines.is_empty() {
        0.0
    } else {
        f64::from(total) / lines.len() as f64
    };

    ReportCard {
        student: student.clone(),
        semester,
        homeroom_teacher: snapshot.homeroom_for_class(&student.class).cloned(),
        lines,
        total,
        average,
        predicate: Predicate::from_average(average),
    }
}

/// Cards for every student of `class`, in roster order.
pub fn class_report_cards(
    snapshot: &DataSnapshot,
    class: &str,
    semester: Semester,
) -> Vec<ReportCard> {
    snapshot
        .students
        .iter()
        .filter(|s| s.class == class)
        .map(|s| report_card(snapshot, s, semester))
        .collect()
}

impl ReportCard {
    pub fn to_table(&self, decimals: usize) -> Table {
        let mut rows: Vec<Vec<String>> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| {
                vec![
                    (i + 1).to_string(),
                    l.subject.clone(),
                    l.score.to_string(),
                    l.predicate.label().to_string(),
                ]
            })
            .collect();
        rows.push(vec![
            String::new(),
            "Total".to_string(),
            self.total.to_string(),
            String::new(),
        ]);
        rows.push(vec![
            String::new(),
            "Average".to_string(),
            format_average(self.average, decimals),
            self.predicate.label().to_string(),
        ]);
        Table {
            columns: vec![
                "No".into(),
                "Subject".into(),
                "Score".into(),
                "Predicate".into(),
            ],
            rows,
        }
    }
}
