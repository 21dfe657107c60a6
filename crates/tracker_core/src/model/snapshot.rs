use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Both task collections in storage order.
///
/// This is the document written to disk and exchanged through export and
/// import: `{ "pending": [...], "completed": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Snapshot {
    /// Parses an exchanged document.
    ///
    /// Malformed JSON is a parse error; JSON that lacks either sequence is a
    /// format error. Individual tasks are not validated.
    pub fn from_document(document: &str) -> Result<Self, AppError> {
        let value: serde_json::Value =
            serde_json::from_str(document).map_err(|err| AppError::parse(err.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| AppError::invalid_format("document must be an object"))?;
        for key in ["pending", "completed"] {
            match object.get(key) {
                Some(serde_json::Value::Array(_)) => {}
                Some(_) => {
                    return Err(AppError::invalid_format(format!("{key} must be an array")));
                }
                None => return Err(AppError::invalid_format(format!("{key} is missing"))),
            }
        }

        serde_json::from_value(value).map_err(|err| AppError::invalid_format(err.to_string()))
    }

    pub fn to_document(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|err| AppError::invalid_data(err.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.pending
            .iter()
            .chain(self.completed.iter())
            .find(|task| task.id == id)
    }

    /// Pending tasks, oldest first. Unreadable stamps go last.
    pub fn pending_sorted(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.pending.iter().collect();
        tasks.sort_by_cached_key(|task| {
            let created = task.created_at();
            (created.is_none(), created)
        });
        tasks
    }

    /// Completed tasks, most recently completed first. Unreadable stamps go last.
    pub fn completed_sorted(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.completed.iter().collect();
        tasks.sort_by_cached_key(|task| {
            let completed = task.completed_at();
            (completed.is_none(), Reverse(completed))
        });
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use crate::model::{ServiceType, Task};
    use proptest::prelude::*;
    use time::format_description::well_known::Rfc3339;
    use time::{Duration, OffsetDateTime};

    fn stamp(offset_secs: i64) -> String {
        (OffsetDateTime::UNIX_EPOCH + Duration::days(20_000) + Duration::seconds(offset_secs))
            .format(&Rfc3339)
            .unwrap()
    }

    fn task(id: &str, created: String, completed: Option<String>) -> Task {
        Task {
            id: id.to_string(),
            name: format!("name-{id}"),
            service_type: ServiceType::Cleaning,
            created_time: created,
            completed_time: completed,
            ..Task::default()
        }
    }

    #[test]
    fn from_document_accepts_empty_collections() {
        let snapshot = Snapshot::from_document(r#"{"pending": [], "completed": []}"#).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn from_document_reports_malformed_json_as_parse_error() {
        let err = Snapshot::from_document("{ not json").unwrap_err();
        assert_eq!(err.code(), "parse_error");
    }

    #[test]
    fn from_document_requires_both_sequences() {
        let missing_completed = Snapshot::from_document(r#"{"pending": []}"#).unwrap_err();
        let missing_pending = Snapshot::from_document(r#"{"completed": []}"#).unwrap_err();
        let not_an_object = Snapshot::from_document("[]").unwrap_err();
        let not_arrays =
            Snapshot::from_document(r#"{"pending": {}, "completed": []}"#).unwrap_err();

        assert_eq!(missing_completed.code(), "invalid_format");
        assert_eq!(missing_pending.code(), "invalid_format");
        assert_eq!(not_an_object.code(), "invalid_format");
        assert_eq!(not_arrays.code(), "invalid_format");
    }

    #[test]
    fn from_document_keeps_duplicate_ids() {
        let document = r#"{
            "pending": [{"id": "a", "name": "one"}],
            "completed": [{"id": "a", "name": "two", "completedTime": "2025-01-01T00:00:00Z"}]
        }"#;

        let snapshot = Snapshot::from_document(document).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find("a").map(|task| task.name.as_str()), Some("one"));
    }

    #[test]
    fn unreadable_stamps_sort_last() {
        let snapshot = Snapshot {
            pending: vec![
                task("bad", "not a time".to_string(), None),
                task("late", stamp(10), None),
                task("early", stamp(0), None),
            ],
            completed: vec![
                task("none", stamp(0), None),
                task("old", stamp(0), Some(stamp(5))),
                task("new", stamp(0), Some(stamp(50))),
            ],
        };

        let pending: Vec<&str> = snapshot
            .pending_sorted()
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        let completed: Vec<&str> = snapshot
            .completed_sorted()
            .iter()
            .map(|task| task.id.as_str())
            .collect();

        assert_eq!(pending, vec!["early", "late", "bad"]);
        assert_eq!(completed, vec!["new", "old", "none"]);
    }

    #[test]
    fn sorting_does_not_touch_storage_order() {
        let snapshot = Snapshot {
            pending: vec![task("b", stamp(10), None), task("a", stamp(0), None)],
            completed: Vec::new(),
        };

        let _ = snapshot.pending_sorted();

        assert_eq!(snapshot.pending[0].id, "b");
    }

    proptest! {
        #[test]
        fn pending_view_is_non_decreasing(offsets in prop::collection::vec(-100_000i64..100_000, 0..40)) {
            let snapshot = Snapshot {
                pending: offsets
                    .iter()
                    .enumerate()
                    .map(|(index, offset)| task(&index.to_string(), stamp(*offset), None))
                    .collect(),
                completed: Vec::new(),
            };

            let view = snapshot.pending_sorted();
            prop_assert_eq!(view.len(), offsets.len());
            for pair in view.windows(2) {
                prop_assert!(pair[0].created_at() <= pair[1].created_at());
            }
        }

        #[test]
        fn completed_view_is_non_increasing(offsets in prop::collection::vec(-100_000i64..100_000, 0..40)) {
            let snapshot = Snapshot {
                pending: Vec::new(),
                completed: offsets
                    .iter()
                    .enumerate()
                    .map(|(index, offset)| task(&index.to_string(), stamp(0), Some(stamp(*offset))))
                    .collect(),
            };

            let view = snapshot.completed_sorted();
            prop_assert_eq!(view.len(), offsets.len());
            for pair in view.windows(2) {
                prop_assert!(pair[0].completed_at() >= pair[1].completed_at());
            }
        }

        #[test]
        fn document_round_trip_is_identity(
            pending in prop::collection::vec(("[a-z0-9]{1,8}", ".{0,12}", -1000i64..1000), 0..8),
            completed in prop::collection::vec(("[a-z0-9]{1,8}", ".{0,12}", -1000i64..1000), 0..8),
        ) {
            let snapshot = Snapshot {
                pending: pending
                    .iter()
                    .map(|(id, remarks, offset)| Task {
                        remarks: remarks.clone(),
                        ..task(id, stamp(*offset), None)
                    })
                    .collect(),
                completed: completed
                    .iter()
                    .map(|(id, remarks, offset)| Task {
                        remarks: remarks.clone(),
                        ..task(id, stamp(0), Some(stamp(*offset)))
                    })
                    .collect(),
            };

            let restored = Snapshot::from_document(&snapshot.to_document().unwrap()).unwrap();
            prop_assert_eq!(restored, snapshot);
        }
    }
}
