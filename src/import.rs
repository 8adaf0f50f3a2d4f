use crate::model::{DataSnapshot, Gender, Student};
use crate::mutate::{
    bulk_replace, import_rejected, Batch, BulkData, Change, LineError, MutationError,
};
use std::collections::HashMap;

const STUDENT_COLUMNS: usize = 4;

fn split_line(line: &str) -> Result<Vec<String>, csv::Error> {
    let delimiter = if line.contains('\t') { b'\t' } else { b',' };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record.iter().map(|f| f.trim().to_string()).collect())
}

/// Parses pasted roster lines of `name, studentId, class, gender`.
/// Returns the parsed students with their 1-based line numbers, plus every
/// line that failed.
pub fn parse_student_lines(text: &str) -> (Vec<(usize, Student)>, Vec<LineError>) {
    let mut students = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let fields = match split_line(raw) {
            Ok(f) => f,
            Err(e) => {
                errors.push(LineError::new(line_no, "bad_columns", e.to_string()));
                continue;
            }
        };
        if fields.len() != STUDENT_COLUMNS {
            errors.push(LineError::new(
                line_no,
                "bad_columns",
                format!(
                    "expected {} columns (name, registration number, class, gender), found {}",
                    STUDENT_COLUMNS,
                    fields.len()
                ),
            ));
            continue;
        }
        if let Some(pos) = fields[..3].iter().position(|f| f.is_empty()) {
            let name = ["name", "registration number", "class"][pos];
            errors.push(LineError::new(
                line_no,
                "empty_field",
                format!("{} must not be empty", name),
            ));
            continue;
        }
        let Some(gender) = Gender::from_code(&fields[3]) else {
            errors.push(LineError::new(
                line_no,
                "bad_gender",
                format!("gender must be L or P, got \"{}\"", fields[3]),
            ));
            continue;
        };
        students.push((
            line_no,
            Student {
                id: String::new(),
                name: fields[0].clone(),
                student_id: fields[1].clone(),
                class: fields[2].clone(),
                gender,
            },
        ));
    }

    (students, errors)
}

/// Appends pasted students to the roster. Any bad line rejects the batch.
pub fn import_students(current: &DataSnapshot, text: &str) -> Result<Change, MutationError> {
    let (parsed, mut errors) = parse_student_lines(text);

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (line, s) in &parsed {
        if current.student_by_registration(&s.student_id).is_some() {
            errors.push(LineError::new(
                *line,
                "duplicate_student_id",
                format!("registration number {} already exists", s.student_id),
            ));
        } else if let Some(prev) = first_seen.get(s.student_id.as_str()) {
            errors.push(LineError::new(
                *line,
                "duplicate_student_id",
                format!(
                    "registration number {} repeats line {}",
                    s.student_id, prev
                ),
            ));
        } else {
            first_seen.insert(s.student_id.as_str(), *line);
        }
    }

    if !errors.is_empty() {
        return Err(import_rejected(errors, "line"));
    }
    if parsed.is_empty() {
        return Err(MutationError::new("bad_params", "no student lines to import"));
    }

    let count = parsed.len();
    let mut roster = current.students.clone();
    roster.extend(parsed.into_iter().map(|(_, s)| s));
    let mut change = bulk_replace(current, BulkData::Students(Batch::numbered(roster)))?;
    change.action = "Import Students".to_string();
    change.details = format!("Imported {} students from pasted text", count);
    Ok(change)
}
