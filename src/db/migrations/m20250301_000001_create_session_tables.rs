use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlaybackPositions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaybackPositions::VideoId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlaybackPositions::PositionMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaybackPositions::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlaybackPositions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchHistory::VideoId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WatchHistory::FileName).string().not_null())
                    .col(ColumnDef::new(WatchHistory::FolderName).string().not_null())
                    .col(
                        ColumnDef::new(WatchHistory::PositionMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WatchHistory::DurationMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WatchHistory::LastPlayedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WatchHistory::DanmuPath).string())
                    .col(
                        ColumnDef::new(WatchHistory::DanmuVisible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WatchHistory::DanmuOffsetMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_history_last_played")
                    .table(WatchHistory::Table)
                    .col(WatchHistory::LastPlayedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VideoPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoPreferences::VideoId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoPreferences::StyleOverride).boolean())
                    .col(ColumnDef::new(VideoPreferences::SubtitleScale).double())
                    .col(ColumnDef::new(VideoPreferences::SubtitlePosition).big_integer())
                    .col(ColumnDef::new(VideoPreferences::SubtitleDelay).double())
                    .col(ColumnDef::new(VideoPreferences::ExternalSubtitle).string())
                    .col(ColumnDef::new(VideoPreferences::SubtitleTrack).big_integer())
                    .col(ColumnDef::new(VideoPreferences::TextColor).string())
                    .col(ColumnDef::new(VideoPreferences::BorderColor).string())
                    .col(ColumnDef::new(VideoPreferences::BackColor).string())
                    .col(ColumnDef::new(VideoPreferences::BorderStyle).string())
                    .col(
                        ColumnDef::new(VideoPreferences::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FolderSkipConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FolderSkipConfigs::FolderId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FolderSkipConfigs::SkipIntroSec)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FolderSkipConfigs::SkipOutroSec)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FolderSkipConfigs::AutoSkipChapter)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FolderSkipConfigs::ChapterIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FolderSkipConfigs::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FolderSkipConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VideoPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WatchHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlaybackPositions::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum PlaybackPositions {
    Table,
    VideoId,
    PositionMs,
    DurationMs,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WatchHistory {
    Table,
    VideoId,
    FileName,
    FolderName,
    PositionMs,
    DurationMs,
    LastPlayedAt,
    DanmuPath,
    DanmuVisible,
    DanmuOffsetMs,
}

#[derive(DeriveIden)]
enum VideoPreferences {
    Table,
    VideoId,
    StyleOverride,
    SubtitleScale,
    SubtitlePosition,
    SubtitleDelay,
    ExternalSubtitle,
    SubtitleTrack,
    TextColor,
    BorderColor,
    BackColor,
    BorderStyle,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FolderSkipConfigs {
    Table,
    FolderId,
    SkipIntroSec,
    SkipOutroSec,
    AutoSkipChapter,
    ChapterIndex,
    UpdatedAt,
}
