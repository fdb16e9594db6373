//! Append-only attendance ledger.

use crate::StoreError;
use chrono::{DateTime, Local};
use rollcall_core::Person;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Local-time format used in every ledger line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write-only attendance log. Records are never read back, mutated, or
/// deleted by the application; the file is the permanent audit trail.
pub struct AttendanceLedger {
    path: PathBuf,
}

impl AttendanceLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one attendance line:
    /// `Time: <ts>, ID: <n>, Name: <s>, Department|Subject: <s>`.
    pub fn record(&self, person: &Person, timestamp: DateTime<Local>) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::LedgerAppend {
                path: self.path.clone(),
                source,
            })?;

        writeln!(
            file,
            "Time: {}, {person}",
            timestamp.format(TIMESTAMP_FORMAT)
        )
        .map_err(|source| StoreError::LedgerAppend {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rollcall_core::Role;

    fn student(id: u32, name: &str, department: &str) -> Person {
        Person {
            id,
            name: name.into(),
            role: Role::Student {
                department: department.into(),
            },
        }
    }

    #[test]
    fn test_record_appends_exactly_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(dir.path().join("attendance.txt"));

        let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        ledger.record(&student(7, "Alice", "Physics"), ts).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("attendance.txt")).unwrap();
        assert_eq!(
            contents,
            "Time: 2024-03-01 09:30:00, ID: 7, Name: Alice, Department: Physics\n"
        );
    }

    #[test]
    fn test_records_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(dir.path().join("attendance.txt"));

        let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        ledger.record(&student(1, "A", "D1"), ts).unwrap();
        ledger.record(&student(2, "B", "D2"), ts).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("attendance.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ID: 1"));
        assert!(lines[1].contains("ID: 2"));
    }

    #[test]
    fn test_teacher_record_uses_subject_label() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(dir.path().join("attendance.txt"));
        let teacher = Person {
            id: 3,
            name: "Bob".into(),
            role: Role::Teacher {
                subject: "History".into(),
            },
        };

        let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        ledger.record(&teacher, ts).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("attendance.txt")).unwrap();
        assert!(contents.contains("Subject: History"));
        assert!(!contents.contains("Department"));
    }

    #[test]
    fn test_unopenable_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // path is a directory: open-for-append must fail
        let ledger = AttendanceLedger::new(dir.path().to_path_buf());

        let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert!(ledger.record(&student(1, "A", "D"), ts).is_err());
    }
}
