use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use db::{
    DbErr, DbPool,
    models::{
        project::Project,
        task::{Task, TaskStatus},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Tasks,
    Projects,
    Users,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TasksReport {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    /// Only statuses that occur are present.
    pub status_count: BTreeMap<TaskStatus, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTaskCount {
    pub id: Uuid,
    pub project_no: i64,
    pub name: String,
    pub task_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectsReport {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub projects: Vec<ProjectTaskCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskCount {
    pub id: Uuid,
    pub username: String,
    pub assigned_task_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UsersReport {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub users: Vec<UserTaskCount>,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub high_priority: u64,
    pub overdue: u64,
}

impl SummaryReport {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let mut summary = SummaryReport {
            kind: ReportKind::Summary,
            total: 0,
            completed: 0,
            pending: 0,
            high_priority: 0,
            overdue: 0,
        };
        for task in tasks {
            let done = task.status == TaskStatus::Completed;
            summary.total += 1;
            if done {
                summary.completed += 1;
            } else {
                summary.pending += 1;
            }
            if task.priority.is_high() {
                summary.high_priority += 1;
            }
            if !done && task.due_date.is_some_and(|due| due < today) {
                summary.overdue += 1;
            }
        }
        summary
    }
}

#[derive(Clone, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    pub async fn tasks(&self, pool: &DbPool) -> Result<TasksReport, DbErr> {
        let mut status_count = BTreeMap::new();
        for task in Task::find_all(pool).await? {
            *status_count.entry(task.status).or_insert(0) += 1;
        }
        Ok(TasksReport {
            kind: ReportKind::Tasks,
            status_count,
        })
    }

    pub async fn projects(&self, pool: &DbPool) -> Result<ProjectsReport, DbErr> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for task in Task::find_all(pool).await? {
            if let Some(project) = task.project {
                *counts.entry(project.id).or_insert(0) += 1;
            }
        }
        let projects = Project::find_all(pool)
            .await?
            .into_iter()
            .map(|project| ProjectTaskCount {
                task_count: counts.get(&project.id).copied().unwrap_or(0),
                id: project.id,
                project_no: project.project_no,
                name: project.name,
            })
            .collect();
        Ok(ProjectsReport {
            kind: ReportKind::Projects,
            projects,
        })
    }

    pub async fn users(&self, pool: &DbPool) -> Result<UsersReport, DbErr> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for task in Task::find_all(pool).await? {
            if let Some(user) = task.assigned_to {
                *counts.entry(user.id).or_insert(0) += 1;
            }
        }
        let users = User::find_all(pool)
            .await?
            .into_iter()
            .map(|user| UserTaskCount {
                assigned_task_count: counts.get(&user.id).copied().unwrap_or(0),
                id: user.id,
                username: user.username,
            })
            .collect();
        Ok(UsersReport {
            kind: ReportKind::Users,
            users,
        })
    }

    pub async fn summary(&self, pool: &DbPool) -> Result<SummaryReport, DbErr> {
        let tasks = Task::find_all(pool).await?;
        Ok(SummaryReport::compute(&tasks, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use db::models::task::TaskPriority;

    use super::*;
    use crate::services::{
        project::{ProjectPayload, ProjectService},
        task::{TaskPayload, TaskService},
        test_db::setup_db,
    };

    fn task_with(status: TaskStatus, priority: TaskPriority, due: Option<NaiveDate>) -> Task {
        Task {
            id: Uuid::new_v4(),
            task_no: 1,
            title: "t".to_string(),
            description: String::new(),
            status,
            priority,
            project: None,
            assigned_to: None,
            due_date: due,
            estimated_hours: 0.0,
            actual_hours: 0.0,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_dashboard_metrics() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 6, 9);
        let tasks = vec![
            task_with(TaskStatus::Completed, TaskPriority::High, yesterday),
            task_with(TaskStatus::Pending, TaskPriority::Critical, yesterday),
            task_with(TaskStatus::InProgress, TaskPriority::Low, Some(today)),
            task_with(TaskStatus::Blocked, TaskPriority::Medium, None),
        ];

        let summary = SummaryReport::compute(&tasks, today);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 3);
        assert_eq!(summary.high_priority, 2);
        assert_eq!(summary.overdue, 1);
    }

    #[tokio::test]
    async fn reports_group_tasks() {
        let pool = setup_db().await;
        let admin = User::create(&pool, "admin", "h").await.unwrap();
        let idle = User::create(&pool, "user2", "h").await.unwrap();
        let projects = ProjectService::new();
        let alpha = projects
            .create_project(
                &pool,
                &ProjectPayload {
                    name: Some("Alpha".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        let empty = projects
            .create_project(
                &pool,
                &ProjectPayload {
                    name: Some("Empty".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();

        let tasks = TaskService::new();
        for status in ["Completada", "Completada", "Pendiente"] {
            tasks
                .create(
                    &pool,
                    admin.id,
                    &TaskPayload {
                        title: Some("t".to_string()),
                        status: Some(status.to_string()),
                        project_id: Some(alpha.id.to_string()),
                        assigned_to_id: Some(admin.id.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let service = ReportService::new();

        let by_status = service.tasks(&pool).await.unwrap();
        assert_eq!(by_status.status_count.get(&TaskStatus::Completed), Some(&2));
        assert_eq!(by_status.status_count.get(&TaskStatus::Pending), Some(&1));
        assert_eq!(by_status.status_count.get(&TaskStatus::Blocked), None);
        let json = serde_json::to_value(&by_status).unwrap();
        assert_eq!(json["type"], "tasks");
        assert_eq!(json["statusCount"]["Completada"], 2);

        let by_project = service.projects(&pool).await.unwrap();
        assert_eq!(
            by_project.projects,
            vec![
                ProjectTaskCount {
                    id: alpha.id,
                    project_no: 1,
                    name: "Alpha".to_string(),
                    task_count: 3,
                },
                ProjectTaskCount {
                    id: empty.id,
                    project_no: 2,
                    name: "Empty".to_string(),
                    task_count: 0,
                },
            ]
        );

        let by_user = service.users(&pool).await.unwrap();
        let counts: Vec<(String, u64)> = by_user
            .users
            .iter()
            .map(|u| (u.username.clone(), u.assigned_task_count))
            .collect();
        assert_eq!(
            counts,
            vec![("admin".to_string(), 3), ("user2".to_string(), 0)]
        );
        assert!(by_user.users.iter().any(|u| u.id == idle.id));

        let summary = service.summary(&pool).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
    }
}
