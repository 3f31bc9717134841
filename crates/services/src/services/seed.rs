use chrono::{Duration, NaiveDate, Utc};
use db::{
    DbPool,
    models::{
        comment::Comment,
        counter::{self, PROJECT_SEQUENCE, TASK_SEQUENCE},
        history::{CreateHistory, HistoryAction, HistoryEntry},
        notification::{Notification, NotificationKind},
        project::{CreateProject, Project},
        task::{Task, TaskFields, TaskPriority, TaskStatus},
        user::User,
    },
};
use thiserror::Error;
use uuid::Uuid;

use super::auth::{AuthError, hash_password};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] db::DbErr),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Seed data references missing {0}")]
    Missing(&'static str),
}

const DEFAULT_USERS: [&str; 3] = ["admin", "user1", "user2"];

const DEFAULT_PROJECTS: [(&str, &str); 3] = [
    ("Proyecto Demo", "Proyecto de ejemplo"),
    ("Proyecto Alpha", "Proyecto importante"),
    ("Proyecto Beta", "Proyecto secundario"),
];

#[derive(Clone, Copy)]
enum Due {
    LastWeek,
    Today,
    NextWeek,
    Never,
}

struct DemoTask {
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: TaskPriority,
    project: usize,
    assignee: Option<usize>,
    due: Due,
    estimated_hours: f64,
    creator: usize,
}

const DEMO_TASKS: [DemoTask; 8] = [
    DemoTask {
        title: "Configurar entorno de desarrollo",
        description: "Instalar dependencias y configurar variables de entorno.",
        status: TaskStatus::Completed,
        priority: TaskPriority::High,
        project: 0,
        assignee: Some(0),
        due: Due::LastWeek,
        estimated_hours: 4.0,
        creator: 0,
    },
    DemoTask {
        title: "Diseñar esquema de base de datos",
        description: "Definir tablas y relaciones para usuarios, tareas y proyectos.",
        status: TaskStatus::Completed,
        priority: TaskPriority::High,
        project: 0,
        assignee: Some(1),
        due: Due::LastWeek,
        estimated_hours: 6.0,
        creator: 0,
    },
    DemoTask {
        title: "Implementar API de autenticación",
        description: "Login con JWT, middleware de autenticación y rutas protegidas.",
        status: TaskStatus::Completed,
        priority: TaskPriority::Critical,
        project: 1,
        assignee: Some(0),
        due: Due::Today,
        estimated_hours: 8.0,
        creator: 0,
    },
    DemoTask {
        title: "CRUD de tareas en el frontend",
        description: "Formulario de tareas, lista, edición y eliminación.",
        status: TaskStatus::InProgress,
        priority: TaskPriority::High,
        project: 1,
        assignee: Some(1),
        due: Due::NextWeek,
        estimated_hours: 12.0,
        creator: 0,
    },
    DemoTask {
        title: "Panel de reportes",
        description: "Reportes por estado, por proyecto y por usuario. Export CSV.",
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        project: 1,
        assignee: Some(2),
        due: Due::NextWeek,
        estimated_hours: 6.0,
        creator: 0,
    },
    DemoTask {
        title: "Notificaciones en tiempo real",
        description: "Opción futura: WebSockets para notificaciones al instante.",
        status: TaskStatus::Pending,
        priority: TaskPriority::Low,
        project: 2,
        assignee: None,
        due: Due::Never,
        estimated_hours: 16.0,
        creator: 1,
    },
    DemoTask {
        title: "Tests unitarios del backend",
        description: "Pruebas para rutas y modelos.",
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        project: 2,
        assignee: Some(2),
        due: Due::NextWeek,
        estimated_hours: 10.0,
        creator: 0,
    },
    DemoTask {
        title: "Documentación de la API",
        description: "OpenAPI o README con ejemplos de endpoints.",
        status: TaskStatus::Blocked,
        priority: TaskPriority::Low,
        project: 0,
        assignee: Some(1),
        due: Due::NextWeek,
        estimated_hours: 4.0,
        creator: 0,
    },
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub projects: usize,
    pub tasks: usize,
}

fn due_date(due: Due, today: NaiveDate) -> Option<NaiveDate> {
    match due {
        Due::LastWeek => Some(today - Duration::days(7)),
        Due::Today => Some(today),
        Due::NextWeek => Some(today + Duration::days(7)),
        Due::Never => None,
    }
}

/// Populates each empty collection with demo data. Users get their username
/// as password.
pub async fn seed_if_empty(pool: &DbPool) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    if User::count(pool).await? == 0 {
        for username in DEFAULT_USERS {
            let password_hash = hash_password(username)?;
            User::create(pool, username, &password_hash).await?;
            summary.users += 1;
        }
    }

    if Project::count(pool).await? == 0 {
        for (name, description) in DEFAULT_PROJECTS {
            let project_no = counter::next_value(pool, PROJECT_SEQUENCE).await?;
            Project::create(
                pool,
                &CreateProject {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
                project_no,
                Uuid::new_v4(),
            )
            .await?;
            summary.projects += 1;
        }
    }

    if Task::find_all(pool).await?.is_empty() {
        summary.tasks = seed_tasks(pool).await?;
    }

    if summary != SeedSummary::default() {
        tracing::info!(
            users = summary.users,
            projects = summary.projects,
            tasks = summary.tasks,
            "Seeded demo data"
        );
    }
    Ok(summary)
}

async fn seed_tasks(pool: &DbPool) -> Result<usize, SeedError> {
    let all_users = User::find_all(pool).await?;
    let projects = Project::find_all(pool).await?;
    if all_users.is_empty() || projects.is_empty() {
        return Ok(0);
    }

    let users: Vec<Uuid> = DEFAULT_USERS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            all_users
                .iter()
                .find(|u| u.username == *name)
                .or_else(|| all_users.get(i))
                .unwrap_or(&all_users[0])
                .id
        })
        .collect();
    let project_ids: Vec<Uuid> = DEFAULT_PROJECTS
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            projects
                .iter()
                .find(|p| p.name == *name)
                .or_else(|| projects.get(i))
                .unwrap_or(&projects[0])
                .id
        })
        .collect();

    let today = Utc::now().date_naive();
    let mut created = Vec::with_capacity(DEMO_TASKS.len());
    for demo in &DEMO_TASKS {
        let fields = TaskFields {
            title: demo.title.to_string(),
            description: demo.description.to_string(),
            status: demo.status,
            priority: demo.priority,
            project_id: Some(project_ids[demo.project]),
            assigned_to_id: demo.assignee.map(|i| users[i]),
            due_date: due_date(demo.due, today),
            estimated_hours: demo.estimated_hours,
            actual_hours: if demo.status == TaskStatus::Completed {
                demo.estimated_hours
            } else {
                0.0
            },
        };
        let task_no = counter::next_value(pool, TASK_SEQUENCE).await?;
        let creator = users[demo.creator];
        let task = Task::create(pool, &fields, task_no, creator, Uuid::new_v4()).await?;
        HistoryEntry::create(
            pool,
            &CreateHistory {
                task_id: task.id,
                user_id: creator,
                action: HistoryAction::Created,
                old_value: String::new(),
                new_value: task.title.clone(),
            },
        )
        .await?;
        created.push(task);
    }

    let task_id = |i: usize| {
        created
            .get(i)
            .map(|t| t.id)
            .ok_or(SeedError::Missing("task"))
    };

    for (task, user, text) in [
        (0, 0, "Listo, entorno funcionando correctamente."),
        (1, 1, "Esquema revisado y aprobado."),
        (2, 0, "JWT configurado con expiración de 7 días."),
        (3, 1, "Avanzando con el formulario de edición."),
    ] {
        Comment::create(pool, task_id(task)?, users[user], text).await?;
    }

    for (task, user, old_value) in [
        (0, 0, "Pendiente"),
        (1, 1, "Pendiente"),
        (2, 0, "En Progreso"),
    ] {
        HistoryEntry::create(
            pool,
            &CreateHistory {
                task_id: task_id(task)?,
                user_id: users[user],
                action: HistoryAction::StatusChanged,
                old_value: old_value.to_string(),
                new_value: TaskStatus::Completed.to_string(),
            },
        )
        .await?;
    }

    // The already-read notification goes in first so the bulk mark only touches it.
    Notification::create(
        pool,
        users[2],
        "Tarea actualizada: Tests unitarios del backend",
        NotificationKind::TaskUpdated,
    )
    .await?;
    Notification::mark_all_read(pool, users[2]).await?;
    Notification::create(
        pool,
        users[1],
        "Nueva tarea asignada: CRUD de tareas en el frontend",
        NotificationKind::TaskAssigned,
    )
    .await?;
    Notification::create(
        pool,
        users[2],
        "Nueva tarea asignada: Panel de reportes",
        NotificationKind::TaskAssigned,
    )
    .await?;

    Ok(created.len())
}
