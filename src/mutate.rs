use crate::model::{DataSnapshot, Gender, Grade, HomeroomTeacher, Student, Teacher};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct MutationError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl MutationError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A validated next snapshot plus the audit label/message describing it.
#[derive(Debug, Clone)]
pub struct Change {
    pub snapshot: DataSnapshot,
    pub action: String,
    pub details: String,
}

impl Change {
    fn new(snapshot: DataSnapshot, action: &str, details: impl Into<String>) -> Self {
        Self {
            snapshot,
            action: action.to_string(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EditAction<T> {
    Add(T),
    Update(T),
    Delete(String),
}

#[derive(Debug, Clone)]
pub enum SubjectAction {
    Add(String),
    Rename { old_name: String, new_name: String },
    Delete(String),
}

/// One rejected record of a batch, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineError {
    pub line: usize,
    pub code: String,
    pub message: String,
}

impl LineError {
    pub fn new(line: usize, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line,
            code: code.into(),
            message: message.into(),
        }
    }
}

pub fn import_rejected(mut errors: Vec<LineError>, unit: &str) -> MutationError {
    errors.sort_by_key(|e| e.line);
    MutationError::new(
        "import_rejected",
        format!("{} {}(s) could not be imported", errors.len(), unit),
    )
    .with_details(json!({ "errors": errors }))
}

/// A roster collection entry that carries its own `id`.
pub trait RosterRecord: DeserializeOwned {
    const ID_PREFIX: &'static str;

    fn id_mut(&mut self) -> &mut String;

    /// Catches field problems serde would only report one at a time.
    fn precheck(_line: usize, _value: &Value) -> Option<LineError> {
        None
    }
}

impl RosterRecord for Student {
    const ID_PREFIX: &'static str = "S";

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }

    fn precheck(line: usize, value: &Value) -> Option<LineError> {
        let raw = value.get("gender")?.as_str()?;
        if Gender::from_label(raw).is_some() {
            return None;
        }
        Some(LineError::new(
            line,
            "bad_gender",
            format!(
                "gender must be {} or {}, got \"{}\"",
                Gender::Male.label(),
                Gender::Female.label(),
                raw
            ),
        ))
    }
}

impl RosterRecord for Teacher {
    const ID_PREFIX: &'static str = "T";

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl RosterRecord for HomeroomTeacher {
    const ID_PREFIX: &'static str = "HR";

    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

/// Records headed for a bulk replace, each with its position in the input.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub records: Vec<(usize, T)>,
    pub rejected: Vec<LineError>,
}

impl<T> Batch<T> {
    pub fn numbered(records: Vec<T>) -> Self {
        Self {
            records: records.into_iter().enumerate().map(|(i, r)| (i + 1, r)).collect(),
            rejected: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

impl<T: RosterRecord> Batch<T> {
    /// Decodes each JSON record on its own so one bad record does not hide
    /// the rest.
    pub fn decode(values: &[Value]) -> Self {
        let mut batch = Self {
            records: Vec::with_capacity(values.len()),
            rejected: Vec::new(),
        };
        for (idx, value) in values.iter().enumerate() {
            let line = idx + 1;
            if let Some(e) = T::precheck(line, value) {
                batch.rejected.push(e);
                continue;
            }
            match serde_json::from_value::<T>(value.clone()) {
                Ok(record) => batch.records.push((line, record)),
                Err(e) => batch
                    .rejected
                    .push(LineError::new(line, "bad_record", e.to_string())),
            }
        }
        batch
    }
}

#[derive(Debug, Clone)]
pub enum BulkData {
    Students(Batch<Student>),
    Teachers(Batch<Teacher>),
    Homeroom(Batch<HomeroomTeacher>),
}

impl BulkData {
    pub fn label(&self) -> &'static str {
        match self {
            BulkData::Students(_) => "Students",
            BulkData::Teachers(_) => "Teachers",
            BulkData::Homeroom(_) => "Homeroom Teachers",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BulkData::Students(b) => b.len(),
            BulkData::Teachers(b) => b.len(),
            BulkData::Homeroom(b) => b.len(),
        }
    }
}

pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn required(value: &str, field: &str) -> Result<String, MutationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(MutationError::new(
            "bad_params",
            format!("{} must not be empty", field),
        ));
    }
    Ok(v.to_string())
}

fn not_found(kind: &str, id: &str) -> MutationError {
    MutationError::new("not_found", format!("{} not found", kind)).with_details(json!({ "id": id }))
}

fn normalize_student(s: Student) -> Result<Student, MutationError> {
    Ok(Student {
        id: s.id.trim().to_string(),
        student_id: required(&s.student_id, "studentId")?,
        name: required(&s.name, "name")?,
        class: required(&s.class, "class")?,
        gender: s.gender,
    })
}

fn duplicate_student_id(student_id: &str) -> MutationError {
    MutationError::new(
        "duplicate_student_id",
        format!("registration number {} is already in use", student_id),
    )
    .with_details(json!({ "studentId": student_id }))
}

fn normalize_teacher(t: Teacher, subjects: &[String]) -> Result<Teacher, MutationError> {
    let name = required(&t.name, "name")?;
    let mut out: Vec<String> = Vec::new();
    for s in t.subjects {
        let s = s.trim().to_string();
        if s.is_empty() || out.contains(&s) {
            continue;
        }
        if !subjects.contains(&s) {
            return Err(MutationError::new(
                "unknown_subject",
                format!("subject \"{}\" does not exist", s),
            )
            .with_details(json!({ "subject": s, "teacher": name })));
        }
        out.push(s);
    }
    Ok(Teacher {
        id: t.id.trim().to_string(),
        name,
        subjects: out,
    })
}

fn normalize_homeroom(h: HomeroomTeacher) -> Result<HomeroomTeacher, MutationError> {
    Ok(HomeroomTeacher {
        id: h.id.trim().to_string(),
        name: required(&h.name, "name")?,
        class: required(&h.class, "class")?,
        contact: h.contact.trim().to_string(),
    })
}

pub fn apply_student(
    current: &DataSnapshot,
    action: EditAction<Student>,
) -> Result<Change, MutationError> {
    let mut next = current.clone();
    match action {
        EditAction::Add(student) => {
            let mut student = normalize_student(student)?;
            if current.student_by_registration(&student.student_id).is_some() {
                return Err(duplicate_student_id(&student.student_id));
            }
            student.id = new_id("S");
            let details = format!("Added student: {} ({})", student.name, student.student_id);
            next.students.push(student);
            Ok(Change::new(next, "Add Student", details))
        }
        EditAction::Update(student) => {
            let student = normalize_student(student)?;
            let Some(pos) = next.students.iter().position(|s| s.id == student.id) else {
                return Err(not_found("student", &student.id));
            };
            if current
                .students
                .iter()
                .any(|s| s.id != student.id && s.student_id == student.student_id)
            {
                return Err(duplicate_student_id(&student.student_id));
            }
            let details = format!("Updated student: {}", student.name);
            next.students[pos] = student;
            Ok(Change::new(next, "Update Student", details))
        }
        EditAction::Delete(id) => {
            let Some(pos) = next.students.iter().position(|s| s.id == id) else {
                return Err(not_found("student", &id));
            };
            let removed = next.students.remove(pos);
            Ok(Change::new(
                next,
                "Delete Student",
                format!("Deleted student: {}", removed.name),
            ))
        }
    }
}

pub fn apply_teacher(
    current: &DataSnapshot,
    action: EditAction<Teacher>,
) -> Result<Change, MutationError> {
    let mut next = current.clone();
    match action {
        EditAction::Add(teacher) => {
            let mut teacher = normalize_teacher(teacher, &current.subjects)?;
            teacher.id = new_id("T");
            let details = format!("Added teacher: {}", teacher.name);
            next.teachers.push(teacher);
            Ok(Change::new(next, "Add Teacher", details))
        }
        EditAction::Update(teacher) => {
            let teacher = normalize_teacher(teacher, &current.subjects)?;
            let Some(pos) = next.teachers.iter().position(|t| t.id == teacher.id) else {
                return Err(not_found("teacher", &teacher.id));
            };
            let details = format!("Updated teacher: {}", teacher.name);
            next.teachers[pos] = teacher;
            Ok(Change::new(next, "Update Teacher", details))
        }
        EditAction::Delete(id) => {
            let Some(pos) = next.teachers.iter().position(|t| t.id == id) else {
                return Err(not_found("teacher", &id));
            };
            let removed = next.teachers.remove(pos);
            Ok(Change::new(
                next,
                "Delete Teacher",
                format!("Deleted teacher: {}", removed.name),
            ))
        }
    }
}

pub fn apply_homeroom(
    current: &DataSnapshot,
    action: EditAction<HomeroomTeacher>,
) -> Result<Change, MutationError> {
    let mut next = current.clone();
    match action {
        EditAction::Add(hr) => {
            let mut hr = normalize_homeroom(hr)?;
            hr.id = new_id("HR");
            let details = format!("Added homeroom teacher: {}", hr.name);
            next.homeroom_teachers.push(hr);
            Ok(Change::new(next, "Add Homeroom Teacher", details))
        }
        EditAction::Update(hr) => {
            let hr = normalize_homeroom(hr)?;
            let Some(pos) = next.homeroom_teachers.iter().position(|h| h.id == hr.id) else {
                return Err(not_found("homeroom teacher", &hr.id));
            };
            let details = format!("Updated homeroom teacher: {}", hr.name);
            next.homeroom_teachers[pos] = hr;
            Ok(Change::new(next, "Update Homeroom Teacher", details))
        }
        EditAction::Delete(id) => {
            let Some(pos) = next.homeroom_teachers.iter().position(|h| h.id == id) else {
                return Err(not_found("homeroom teacher", &id));
            };
            let removed = next.homeroom_teachers.remove(pos);
            Ok(Change::new(
                next,
                "Delete Homeroom Teacher",
                format!("Deleted homeroom teacher: {}", removed.name),
            ))
        }
    }
}

fn subject_exists(name: &str) -> MutationError {
    MutationError::new("subject_exists", format!("subject \"{}\" already exists", name))
        .with_details(json!({ "subject": name }))
}

pub fn apply_subject(
    current: &DataSnapshot,
    action: SubjectAction,
) -> Result<Change, MutationError> {
    let mut next = current.clone();
    match action {
        SubjectAction::Add(name) => {
            let name = required(&name, "subject")?;
            if current.subjects.contains(&name) {
                return Err(subject_exists(&name));
            }
            next.subjects.push(name.clone());
            next.subjects.sort();
            Ok(Change::new(
                next,
                "Add Subject",
                format!("Added subject: {}", name),
            ))
        }
        SubjectAction::Rename { old_name, new_name } => {
            let new_name = required(&new_name, "newName")?;
            if !current.subjects.contains(&old_name) {
                return Err(MutationError::new("not_found", "subject not found")
                    .with_details(json!({ "subject": old_name })));
            }
            if new_name != old_name && current.subjects.contains(&new_name) {
                return Err(subject_exists(&new_name));
            }

            // Subjects, teacher assignments and grades move together.
            for s in next.subjects.iter_mut().filter(|s| **s == old_name) {
                *s = new_name.clone();
            }
            next.subjects.sort();
            for t in next.teachers.iter_mut() {
                for s in t.subjects.iter_mut().filter(|s| **s == old_name) {
                    *s = new_name.clone();
                }
            }
            for g in next.grades.iter_mut().filter(|g| g.subject == old_name) {
                g.subject = new_name.clone();
            }
            Ok(Change::new(
                next,
                "Rename Subject",
                format!("Renamed subject from \"{}\" to \"{}\"", old_name, new_name),
            ))
        }
        SubjectAction::Delete(name) => {
            if !current.subjects.contains(&name) {
                return Err(MutationError::new("not_found", "subject not found")
                    .with_details(json!({ "subject": name })));
            }
            let teachers: Vec<&str> = current
                .teachers
                .iter()
                .filter(|t| t.subjects.contains(&name))
                .map(|t| t.name.as_str())
                .collect();
            let grade_count = current.grades.iter().filter(|g| g.subject == name).count();
            if !teachers.is_empty() || grade_count > 0 {
                return Err(MutationError::new(
                    "subject_in_use",
                    format!(
                        "cannot delete \"{}\" because it is used by teachers or grade records",
                        name
                    ),
                )
                .with_details(json!({
                    "subject": name,
                    "teachers": teachers,
                    "gradeCount": grade_count,
                })));
            }
            next.subjects.retain(|s| *s != name);
            Ok(Change::new(
                next,
                "Delete Subject",
                format!("Deleted subject: {}", name),
            ))
        }
    }
}

/// Upserts `grades` by (studentId, subject, semester). Every student must be
/// on the roster, and each grade is filed under that student's roster class.
/// `subject` and `class` only feed the audit message.
pub fn save_grades(
    current: &DataSnapshot,
    mut grades: Vec<Grade>,
    subject: &str,
    class: &str,
) -> Result<Change, MutationError> {
    if grades.is_empty() {
        return Err(MutationError::new("bad_params", "no grades to save"));
    }
    for g in grades.iter_mut() {
        if g.student_id.trim().is_empty() || g.subject.trim().is_empty() {
            return Err(MutationError::new(
                "bad_params",
                "grade records need studentId and subject",
            ));
        }
        let Some(student) = current.student_by_registration(&g.student_id) else {
            return Err(MutationError::new(
                "not_found",
                format!("student {} is not on the roster", g.student_id),
            )
            .with_details(json!({ "studentId": g.student_id })));
        };
        g.class = student.class.clone();
    }

    let count = grades.len();
    let mut next = current.clone();
    for grade in grades {
        match next.grades.iter().position(|g| g.same_key(&grade)) {
            Some(i) => next.grades[i] = grade,
            None => next.grades.push(grade),
        }
    }
    Ok(Change::new(
        next,
        "Save Grades",
        format!(
            "Saved {} grades for subject {} in class {}",
            count, subject, class
        ),
    ))
}

fn collect_batch<T: RosterRecord>(
    batch: Batch<T>,
    errors: &mut Vec<LineError>,
    mut check: impl FnMut(T) -> Result<T, MutationError>,
) -> Vec<T> {
    errors.extend(batch.rejected);
    let mut ids: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(batch.records.len());
    for (line, record) in batch.records {
        let mut record = match check(record) {
            Ok(r) => r,
            Err(e) => {
                errors.push(LineError::new(line, e.code, e.message));
                continue;
            }
        };
        let id = record.id_mut();
        if id.is_empty() {
            *id = new_id(T::ID_PREFIX);
        } else if let Some(first) = ids.get(id.as_str()) {
            errors.push(LineError::new(
                line,
                "duplicate_id",
                format!("id {} repeats record {}", id, first),
            ));
            continue;
        }
        ids.insert(id.clone(), line);
        out.push(record);
    }
    out
}

/// Wholesale replacement of one roster collection. Every failing record is
/// reported; nothing is replaced unless all of them pass.
pub fn bulk_replace(current: &DataSnapshot, data: BulkData) -> Result<Change, MutationError> {
    let label = data.label();
    let count = data.len();
    let mut errors = Vec::new();
    let mut next = current.clone();
    match data {
        BulkData::Students(batch) => {
            let mut registrations: HashSet<String> = HashSet::new();
            next.students = collect_batch(batch, &mut errors, |s| {
                let s = normalize_student(s)?;
                if !registrations.insert(s.student_id.clone()) {
                    return Err(duplicate_student_id(&s.student_id));
                }
                Ok(s)
            });
        }
        BulkData::Teachers(batch) => {
            next.teachers = collect_batch(batch, &mut errors, |t| {
                normalize_teacher(t, &current.subjects)
            });
        }
        BulkData::Homeroom(batch) => {
            next.homeroom_teachers = collect_batch(batch, &mut errors, normalize_homeroom);
        }
    }
    if !errors.is_empty() {
        return Err(import_rejected(errors, "record"));
    }
    Ok(Change::new(
        next,
        &format!("Replace {}", label),
        format!("Replaced {} list with {} records", label.to_lowercase(), count),
    ))
}
