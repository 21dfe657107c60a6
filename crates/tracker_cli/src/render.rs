use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracker_core::config::Palette;
use tracker_core::error::AppError;
use tracker_core::model::Task;

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Remarks")]
    remarks: String,
    #[tabled(rename = "Time")]
    time: String,
}

/// How results are shown: plain tables or JSON, and in which time zone.
pub struct Output {
    pub json: bool,
    pub palette: Palette,
    pub offset: UtcOffset,
}

impl Output {
    pub fn new(json: bool, palette: Palette) -> Self {
        Self {
            json,
            palette,
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// Renders one section. Completed rows show the completion time.
    pub fn task_table(&self, heading: &str, tasks: &[&Task], completed: bool) -> String {
        let heading = self.palette.accentize(heading);
        if tasks.is_empty() {
            return format!("{heading}\n{}", self.palette.mutedize("(none)"));
        }

        let rows = tasks.iter().map(|task| {
            let stamp = if completed {
                task.completed_time.as_deref().unwrap_or_default()
            } else {
                task.created_time.as_str()
            };
            TaskRow {
                id: task.id.clone(),
                name: task.name.clone(),
                service: task.service_type.to_string(),
                description: or_dash(&task.description),
                remarks: or_dash(&task.remarks),
                time: self.timestamp(stamp),
            }
        });

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!("{heading}\n{table}")
    }

    pub fn task_detail(&self, task: &Task) -> String {
        let status = if task.is_completed() {
            "completed"
        } else {
            "pending"
        };
        let completed = task
            .completed_time
            .as_deref()
            .map(|stamp| self.timestamp(stamp))
            .unwrap_or_else(|| "-".to_string());

        [
            format!("{} {}", self.palette.accentize("ID:"), task.id),
            format!("Name: {}", task.name),
            format!("Service: {}", task.service_type),
            format!("Description: {}", or_dash(&task.description)),
            format!("Remarks: {}", or_dash(&task.remarks)),
            format!("Status: {status}"),
            format!("Created: {}", self.timestamp(&task.created_time)),
            format!("Completed: {completed}"),
        ]
        .join("\n")
    }

    /// Local `YYYY-MM-DD HH:MM`; stamps that do not parse are shown as stored.
    pub fn timestamp(&self, raw: &str) -> String {
        if raw.is_empty() {
            return "-".to_string();
        }
        OffsetDateTime::parse(raw, &Rfc3339)
            .ok()
            .and_then(|parsed| parsed.to_offset(self.offset).format(DISPLAY_FORMAT).ok())
            .unwrap_or_else(|| raw.to_string())
    }
}

pub fn task_json(task: &Task) -> Result<String, AppError> {
    serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn tasks_json(pending: &[&Task], completed: &[&Task]) -> Result<String, AppError> {
    let payload = serde_json::json!({
        "pending": pending,
        "completed": completed,
    });
    serde_json::to_string(&payload).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn export_json(path: &Path, count: usize) -> Result<String, AppError> {
    let payload = serde_json::json!({
        "path": path.display().to_string(),
        "count": count,
    });
    serde_json::to_string(&payload).map_err(|err| AppError::invalid_data(err.to_string()))
}

fn or_dash(text: &str) -> String {
    if text.is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}
