// 服务层错误类型定义
//
// 每层一个错误枚举，API 层统一映射为 HTTP 状态码

use thiserror::Error;

use crate::database::GatewayError;
use crate::models::{ContentType, Relation, UnknownContentType, ValidationError};
use crate::storage::{Bucket, StorageError};

/// 上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload to {bucket} failed: {source}")]
    Rejected {
        bucket: Bucket,
        #[source]
        source: StorageError,
    },

    #[error("Unsupported media for {bucket}: {reason}")]
    UnsupportedMedia { bucket: Bucket, reason: String },
}

/// 时长解析错误
#[derive(Debug, Error)]
pub enum DurationDecodeError {
    #[error("ffprobe binary not available: {0}")]
    ProbeUnavailable(std::io::Error),

    #[error("ffprobe failed (exit code {exit_code:?}): {stderr}")]
    ProbeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to parse probe output: {0}")]
    Parse(String),

    #[error("Container reports no usable duration: {0}")]
    InvalidDuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 目录查询层错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    DurationDecode(#[from] DurationDecodeError),

    #[error("Insert into {relation} failed: {source}")]
    Insert {
        relation: Relation,
        #[source]
        source: GatewayError,
    },

    #[error("Insert into {0} returned no rows")]
    InsertEmpty(Relation),

    #[error("Update of {relation} failed: {source}")]
    Update {
        relation: Relation,
        #[source]
        source: GatewayError,
    },

    #[error("Delete from {relation} failed: {source}")]
    Delete {
        relation: Relation,
        #[source]
        source: GatewayError,
    },

    #[error("Query on {relation} failed: {source}")]
    Query {
        relation: Relation,
        #[source]
        source: GatewayError,
    },

    #[error("Row of {relation} could not be decoded: {message}")]
    Decode { relation: Relation, message: String },

    #[error("{relation} row {id} not found")]
    NotFound { relation: Relation, id: i64 },

    #[error(transparent)]
    UnknownContentType(#[from] UnknownContentType),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CatalogError {
    /// Whether the underlying gateway failure may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Insert { source, .. }
            | CatalogError::Update { source, .. }
            | CatalogError::Delete { source, .. }
            | CatalogError::Query { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// 工作流错误（失败时状态不变）
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} while in {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Form is for {got} but the workflow is authoring {expected}")]
    FormMismatch { expected: ContentType, got: ContentType },

    #[error("Required file missing: {0}")]
    MissingFile(&'static str),

    #[error("{unit} {requested} is outside 1..={declared}")]
    SeasonOutOfRange {
        unit: &'static str,
        requested: u32,
        declared: u32,
    },

    #[error("Episode {requested} is outside 1..={max}")]
    EpisodeOutOfRange { requested: u32, max: u32 },

    #[error("Cannot finish: {unit} {missing:?} still have no episodes")]
    SeasonsIncomplete {
        unit: &'static str,
        missing: Vec<u32>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<UploadError> for WorkflowError {
    fn from(err: UploadError) -> Self {
        WorkflowError::Catalog(CatalogError::Upload(err))
    }
}

impl From<DurationDecodeError> for WorkflowError {
    fn from(err: DurationDecodeError) -> Self {
        WorkflowError::Catalog(CatalogError::DurationDecode(err))
    }
}

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Authentication is not configured for the {0} backend")]
    Unavailable(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Gateway(GatewayError::from(err))
    }
}
