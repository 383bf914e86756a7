use std::{fmt, io, path::StripPrefixError};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ZettelError {
    #[error("Asset copy from {src} to {dest} failed: {message}")]
    AssetCopy {
        src: String,
        dest: String,
        message: String,
    },
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Not Found: {{ url: {url:?}, filePath: {path:?}, cwd: {cwd:?} }}")]
    PageNotFound {
        url: String,
        path: String,
        cwd: String,
    },
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("Couldn't find a free port in {start}..{end}")]
    PortExhausted { start: u16, end: u16 },
    #[error("Rendering {page} failed: {message}")]
    Render { page: String, message: String },
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Found unknown crossrefs in {description} note \"{note}\": {unknown:?}")]
    UndefinedCrossReference {
        note: String,
        description: String,
        unknown: Vec<String>,
    },
}

impl ZettelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ZettelError::AssetCopy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ZettelError::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZettelError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZettelError::NotFound(_) => StatusCode::NOT_FOUND,
            ZettelError::PageNotFound { .. } => StatusCode::NOT_FOUND,
            ZettelError::PathNotFound(_) => StatusCode::NOT_FOUND,
            ZettelError::PermissionDenied => StatusCode::FORBIDDEN,
            ZettelError::PortExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ZettelError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ZettelError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZettelError::UndefinedCrossReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Wrap any error raised while producing `page` as a [`ZettelError::Render`].
    pub fn render(page: impl Into<String>, err: impl fmt::Display) -> Self {
        ZettelError::Render {
            page: page.into(),
            message: err.to_string(),
        }
    }
}

impl From<StripPrefixError> for ZettelError {
    fn from(src: StripPrefixError) -> ZettelError {
        ZettelError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for ZettelError {
    fn from(src: toml::de::Error) -> ZettelError {
        ZettelError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for ZettelError {
    fn from(src: JsonError) -> ZettelError {
        ZettelError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for ZettelError {
    fn from(src: UrlParseError) -> ZettelError {
        ZettelError::Serialization(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for ZettelError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => ZettelError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => ZettelError::PermissionDenied,
            _ => ZettelError::Io(format!("IOError: {}: {x}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for ZettelError {
    fn from(x: walkdir::Error) -> Self {
        let path = x
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match x.into_io_error() {
            Some(io_error) if io_error.kind() == io::ErrorKind::NotFound => {
                ZettelError::PathNotFound(path)
            }
            Some(io_error) => io_error.into(),
            None => ZettelError::Io(format!("Filesystem loop detected at {path}")),
        }
    }
}

impl From<fmt::Error> for ZettelError {
    fn from(x: fmt::Error) -> Self {
        ZettelError::Custom(format!("{x}"))
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for ZettelError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => ZettelError::Custom(format!(
                "notify: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => ZettelError::Custom(format!(
                "notify: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => ZettelError::PathNotFound(format!(
                "notify: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => ZettelError::NotFound(format!(
                "notify: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                ZettelError::Custom("notify invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                ZettelError::Custom("notify max file watch limit reached".to_string())
            }
        }
    }
}
