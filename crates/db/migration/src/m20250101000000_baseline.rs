use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        create_unique_index(manager, "idx_users_uuid", Users::Table, Users::Uuid).await?;
        create_unique_index(manager, "idx_users_username", Users::Table, Users::Username).await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(uuid_col(Projects::Uuid))
                    .col(ColumnDef::new(Projects::ProjectNo).big_integer().not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(
                        ColumnDef::new(Projects::Description)
                            .text()
                            .not_null()
                            .default(Expr::val("")),
                    )
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        create_unique_index(manager, "idx_projects_uuid", Projects::Table, Projects::Uuid).await?;
        create_unique_index(
            manager,
            "idx_projects_project_no",
            Projects::Table,
            Projects::ProjectNo,
        )
        .await?;

        // project_id and assigned_to_id carry no foreign key: deleting a
        // project leaves tasks pointing at a row that no longer resolves.
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(ColumnDef::new(Tasks::TaskNo).big_integer().not_null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(
                        ColumnDef::new(Tasks::Description)
                            .text()
                            .not_null()
                            .default(Expr::val("")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("Pendiente")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("Media")),
                    )
                    .col(fk_id_nullable_col(manager, Tasks::ProjectId))
                    .col(fk_id_nullable_col(manager, Tasks::AssignedToId))
                    .col(ColumnDef::new(Tasks::DueDate).date())
                    .col(hours_col(Tasks::EstimatedHours))
                    .col(hours_col(Tasks::ActualHours))
                    .col(fk_id_col(manager, Tasks::CreatedById))
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_created_by_id")
                            .from(Tasks::Table, Tasks::CreatedById)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        create_unique_index(manager, "idx_tasks_uuid", Tasks::Table, Tasks::Uuid).await?;
        create_unique_index(manager, "idx_tasks_task_no", Tasks::Table, Tasks::TaskNo).await?;
        create_index(manager, "idx_tasks_status", Tasks::Table, Tasks::Status).await?;
        create_index(manager, "idx_tasks_project_id", Tasks::Table, Tasks::ProjectId).await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Comments::Table)
                    .col(pk_id_col(manager, Comments::Id))
                    .col(uuid_col(Comments::Uuid))
                    .col(fk_id_col(manager, Comments::TaskId))
                    .col(fk_id_col(manager, Comments::UserId))
                    .col(ColumnDef::new(Comments::CommentText).text().not_null())
                    .col(timestamp_col(Comments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_task_id")
                            .from(Comments::Table, Comments::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_user_id")
                            .from(Comments::Table, Comments::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        create_unique_index(manager, "idx_comments_uuid", Comments::Table, Comments::Uuid).await?;
        create_index(manager, "idx_comments_task_id", Comments::Table, Comments::TaskId).await?;

        // History keys its task by uuid so the trail outlives the task row.
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(History::Table)
                    .col(pk_id_col(manager, History::Id))
                    .col(uuid_col(History::Uuid))
                    .col(uuid_col(History::TaskUuid))
                    .col(fk_id_col(manager, History::UserId))
                    .col(ColumnDef::new(History::Action).string_len(32).not_null())
                    .col(
                        ColumnDef::new(History::OldValue)
                            .text()
                            .not_null()
                            .default(Expr::val("")),
                    )
                    .col(
                        ColumnDef::new(History::NewValue)
                            .text()
                            .not_null()
                            .default(Expr::val("")),
                    )
                    .col(timestamp_col(History::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_user_id")
                            .from(History::Table, History::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        create_unique_index(manager, "idx_history_uuid", History::Table, History::Uuid).await?;
        create_index(manager, "idx_history_task_uuid", History::Table, History::TaskUuid).await?;
        create_index(manager, "idx_history_timestamp", History::Table, History::Timestamp).await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Notifications::Table)
                    .col(pk_id_col(manager, Notifications::Id))
                    .col(uuid_col(Notifications::Uuid))
                    .col(fk_id_col(manager, Notifications::UserId))
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(timestamp_col(Notifications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        create_unique_index(
            manager,
            "idx_notifications_uuid",
            Notifications::Table,
            Notifications::Uuid,
        )
        .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_notifications_user_id_read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::Read)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Counters::Table)
                    .col(pk_id_col(manager, Counters::Id))
                    .col(ColumnDef::new(Counters::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Counters::Seq)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .to_owned(),
            )
            .await?;

        // The upsert in the sequence generator conflicts on this index.
        create_unique_index(manager, "idx_counters_name", Counters::Table, Counters::Name).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Counters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(History::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

async fn create_unique_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr>
where
    T: Iden + 'static,
    C: Iden + 'static,
{
    manager
        .create_index(
            Index::create().if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .unique()
                .to_owned(),
        )
        .await
}

async fn create_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr>
where
    T: Iden + 'static,
    C: Iden + 'static,
{
    manager
        .create_index(
            Index::create().if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .to_owned(),
        )
        .await
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn hours_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .double()
        .not_null()
        .default(Expr::val(0.0))
        .to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Username,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Uuid,
    ProjectNo,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    TaskNo,
    Title,
    Description,
    Status,
    Priority,
    ProjectId,
    AssignedToId,
    DueDate,
    EstimatedHours,
    ActualHours,
    CreatedById,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    Uuid,
    TaskId,
    UserId,
    CommentText,
    CreatedAt,
}

#[derive(Iden)]
enum History {
    Table,
    Id,
    Uuid,
    TaskUuid,
    UserId,
    Action,
    OldValue,
    NewValue,
    Timestamp,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    Uuid,
    UserId,
    Message,
    Kind,
    Read,
    CreatedAt,
}

#[derive(Iden)]
enum Counters {
    Table,
    Id,
    Name,
    Seq,
}
