use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::LastActive).big_integer().null())
                    // 小写后的用户名与邮箱，用于大小写不敏感搜索
                    .col(
                        ColumnDef::new(Users::SearchText)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建代码提交表
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Title).string().not_null())
                    .col(ColumnDef::new(Submissions::Description).text().null())
                    .col(ColumnDef::new(Submissions::Language).string().not_null())
                    .col(ColumnDef::new(Submissions::Code).text().not_null())
                    .col(ColumnDef::new(Submissions::Tags).text().not_null())
                    // 小写后的标题与描述，用于大小写不敏感搜索
                    .col(
                        ColumnDef::new(Submissions::SearchText)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(ColumnDef::new(Submissions::AnalysisResult).text().null())
                    .col(
                        ColumnDef::new(Submissions::AnalyzedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::FeedbackTeacherId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Submissions::FeedbackComment).text().null())
                    .col(ColumnDef::new(Submissions::FeedbackGrade).double().null())
                    .col(
                        ColumnDef::new(Submissions::FeedbackAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_owner_id")
                    .table(Submissions::Table)
                    .col(Submissions::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_created_at")
                    .table(Submissions::Table)
                    .col(Submissions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_language_status")
                    .table(Submissions::Table)
                    .col(Submissions::Language)
                    .col(Submissions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role_last_active")
                    .table(Users::Table)
                    .col(Users::Role)
                    .col(Users::LastActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    LastActive,
    SearchText,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    Language,
    Code,
    Tags,
    SearchText,
    Status,
    AnalysisResult,
    AnalyzedAt,
    FeedbackTeacherId,
    FeedbackComment,
    FeedbackGrade,
    FeedbackAt,
    CreatedAt,
    UpdatedAt,
}
