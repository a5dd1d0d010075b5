//! Crate-level error type

use thiserror::Error;

use crate::comments::CommentError;
use crate::editing::CommandError;
use crate::export::ExportError;
use crate::layout::GeometryError;
use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("no template with id `{0}`")]
    TemplateNotFound(String),
}
