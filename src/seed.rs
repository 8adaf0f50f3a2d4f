use crate::model::DataSnapshot;

const DEFAULT_SUBJECTS: &[&str] = &[
    "Aqidah",
    "Bahasa Arab",
    "Fiqih",
    "Hadits",
    "Nahwu",
    "Shorof",
    "Tafsir",
    "Tarikh Islam",
];

/// First snapshot of a fresh workbook: the standard subject list and an
/// empty roster.
pub fn default_snapshot() -> DataSnapshot {
    let mut subjects: Vec<String> = DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect();
    subjects.sort();
    DataSnapshot {
        subjects,
        ..DataSnapshot::default()
    }
}
