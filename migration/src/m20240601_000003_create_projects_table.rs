use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Projects)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Title).string().not_null().unique_key())
                    .col(ColumnDef::new(Project::Owner).string().not_null())
                    .col(ColumnDef::new(Project::City).string().not_null())
                    .col(ColumnDef::new(Project::Country).string().not_null())
                    .col(ColumnDef::new(Project::Location).string().not_null())
                    .col(ColumnDef::new(Project::Category).string().not_null())
                    .col(ColumnDef::new(Project::MapUrl).string().not_null())
                    .col(ColumnDef::new(Project::OffPlan).boolean())
                    .col(ColumnDef::new(Project::CompletionDate).string())
                    .col(ColumnDef::new(Project::Description).text())
                    .col(ColumnDef::new(Project::PdfUrl).string())
                    .col(ColumnDef::new(Project::AgentId).uuid().not_null())
                    .col(ColumnDef::new(Project::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Project::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_agent")
                            .from(Project::Projects, Project::AgentId)
                            .to(Agent::Agents, Agent::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Installment::Installments)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Installment::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Installment::Title).string().not_null())
                    .col(ColumnDef::new(Installment::Percentage).double().not_null())
                    .col(ColumnDef::new(Installment::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Installment::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installment_project")
                            .from(Installment::Installments, Installment::ProjectId)
                            .to(Project::Projects, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_installment_project_title")
                    .table(Installment::Installments)
                    .col(Installment::ProjectId)
                    .col(Installment::Title)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Installment::Installments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Projects).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Project {
    Projects,
    Id,
    Title,
    Owner,
    City,
    Country,
    Location,
    Category,
    MapUrl,
    OffPlan,
    CompletionDate,
    Description,
    PdfUrl,
    AgentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Installment {
    Installments,
    Id,
    ProjectId,
    Title,
    Percentage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Agent {
    Agents,
    Id,
}
