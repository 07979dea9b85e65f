//! Ingestion state entity, one row per watched filename.

use sea_orm::entity::prelude::*;

/// Outcome of the last processing attempt for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FileStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "error")]
    Error,
}

impl FileStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File metadata entity model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_metadata")]
pub struct Model {
    /// Base filename of the watched file.
    #[sea_orm(primary_key, auto_increment = false)]
    pub filename: String,

    /// Filesystem modification time accepted as processed (the watermark).
    /// `None` while only retryable failures have been recorded.
    pub last_modified: Option<DateTimeUtc>,

    /// When the last processing attempt completed.
    pub last_processed: DateTimeUtc,

    /// Outcome of the last attempt.
    pub status: FileStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
