use std::fmt::Write;

use db::{DbErr, DbPool, models::task::Task};

pub const TASKS_CSV_HEADER: &str = "ID,Título,Estado,Prioridad,Proyecto";
pub const TASKS_CSV_FILENAME: &str = "export_tasks.csv";
const NO_PROJECT: &str = "Sin proyecto";

/// Quotes a field containing a comma, quote or newline, doubling inner quotes.
pub fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_tasks_csv(tasks: &[Task]) -> String {
    let mut csv = String::with_capacity(64 * (tasks.len() + 1));
    csv.push_str(TASKS_CSV_HEADER);
    csv.push('\n');
    for task in tasks {
        let project = task
            .project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or(NO_PROJECT);
        let _ = writeln!(
            csv,
            "{},{},{},{},{}",
            task.task_no,
            csv_escape(&task.title),
            csv_escape(&task.status.to_string()),
            csv_escape(&task.priority.to_string()),
            csv_escape(project),
        );
    }
    csv
}

#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Every task ordered by task number.
    pub async fn tasks_csv(&self, pool: &DbPool) -> Result<String, DbErr> {
        let tasks = Task::find_all(pool).await?;
        Ok(render_tasks_csv(&tasks))
    }
}
