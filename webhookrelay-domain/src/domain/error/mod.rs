#[cfg(feature = "axum-error")]
pub mod axum_error;

use crate::prelude::StringExt;
use http::StatusCode;
use serde::Serialize;
use std::convert::AsRef;
use std::{
    error::Error as StdError,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
};
use strum::AsRefStr;
use thiserror::Error as ThisError;

pub trait ErrorMeta {
    fn code(&self) -> ErrorCode;
    fn key(&self) -> ErrorKey;
    fn message(&self) -> ErrorMessage;
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorKey(String);

impl ErrorKey {
    pub fn internal(key: &str, subtype: Option<&str>) -> Self {
        if let Some(subtype) = subtype {
            ErrorKey(format!("err::internal::{}::{}", key, subtype))
        } else {
            ErrorKey(format!("err::internal::{}", key))
        }
    }

    pub fn application(key: &str, subtype: Option<&str>) -> Self {
        if let Some(subtype) = subtype {
            ErrorKey(format!("err::application::{}::{}", key, subtype))
        } else {
            ErrorKey(format!("err::application::{}", key))
        }
    }
}

impl Display for ErrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorMessage(String);

impl AsRef<str> for ErrorMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Failures raised while building or delivering a webhook request.
#[derive(ThisError, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum InternalError {
    #[error("An unknown error occurred: {}", .message)]
    UnknownError {
        message: String,
        subtype: Option<String>,
    },
    #[error("A connection error occurred: {}", .message)]
    ConnectionError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Argument provided is invalid: {}", .message)]
    InvalidArgument {
        message: String,
        subtype: Option<String>,
    },
    #[error("An error while performing an IO operation: {}", .message)]
    IOErr {
        message: String,
        subtype: Option<String>,
    },
    #[error("Configuration error: {}", .message)]
    ConfigurationError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Serialization error: {}", .message)]
    SerializeError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Deserialization error: {}", .message)]
    DeserializeError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Template substitution error: {}", .message)]
    TemplateSubstitutionError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Cycle detected in event data: {}", .message)]
    CycleDetected {
        message: String,
        subtype: Option<String>,
    },
}

impl From<anyhow::Error> for InternalError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<InternalError>() {
            Some(relay_error) => relay_error.clone(),
            None => InternalError::UnknownError {
                message: error.to_string(),
                subtype: None,
            },
        }
    }
}

impl InternalError {
    pub fn unknown(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::UnknownError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn connection_error(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::ConnectionError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn invalid_argument(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::InvalidArgument {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn io_err(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::IOErr {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn configuration_error(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::ConfigurationError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn serialize_error(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::SerializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn deserialize_error(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::DeserializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn template_substitution_error(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::TemplateSubstitutionError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }

    pub fn cycle_detected(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::internal(InternalError::CycleDetected {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }
}

impl ErrorMeta for InternalError {
    fn code(&self) -> ErrorCode {
        match self {
            InternalError::UnknownError { .. } => ErrorCode(1000),
            InternalError::ConnectionError { .. } => ErrorCode(1003),
            InternalError::InvalidArgument { .. } => ErrorCode(1005),
            InternalError::IOErr { .. } => ErrorCode(1006),
            InternalError::ConfigurationError { .. } => ErrorCode(1009),
            InternalError::SerializeError { .. } => ErrorCode(1011),
            InternalError::DeserializeError { .. } => ErrorCode(1012),
            InternalError::TemplateSubstitutionError { .. } => ErrorCode(1013),
            InternalError::CycleDetected { .. } => ErrorCode(1014),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            InternalError::UnknownError { subtype, .. } => {
                ErrorKey::internal("unknown", subtype.as_deref())
            }
            InternalError::ConnectionError { subtype, .. } => {
                ErrorKey::internal("connection_error", subtype.as_deref())
            }
            InternalError::InvalidArgument { subtype, .. } => {
                ErrorKey::internal("invalid_argument", subtype.as_deref())
            }
            InternalError::IOErr { subtype, .. } => {
                ErrorKey::internal("io_err", subtype.as_deref())
            }
            InternalError::ConfigurationError { subtype, .. } => {
                ErrorKey::internal("configuration_error", subtype.as_deref())
            }
            InternalError::SerializeError { subtype, .. } => {
                ErrorKey::internal("serialize_error", subtype.as_deref())
            }
            InternalError::DeserializeError { subtype, .. } => {
                ErrorKey::internal("deserialize_error", subtype.as_deref())
            }
            InternalError::TemplateSubstitutionError { subtype, .. } => {
                ErrorKey::internal("template_substitution_error", subtype.as_deref())
            }
            InternalError::CycleDetected { subtype, .. } => {
                ErrorKey::internal("cycle_detected", subtype.as_deref())
            }
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            InternalError::UnknownError { message, .. }
            | InternalError::ConnectionError { message, .. }
            | InternalError::InvalidArgument { message, .. }
            | InternalError::IOErr { message, .. }
            | InternalError::ConfigurationError { message, .. }
            | InternalError::SerializeError { message, .. }
            | InternalError::DeserializeError { message, .. }
            | InternalError::TemplateSubstitutionError { message, .. }
            | InternalError::CycleDetected { message, .. } => ErrorMessage(message.to_string()),
        }
    }
}

impl Debug for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n", &self)?;
        let mut current = self.source();
        while let Some(cause) = current {
            writeln!(f, "Caused by:\n\t{}", cause)?;
            current = cause.source();
        }
        Ok(())
    }
}

/// Errors surfaced to callers of the ingress API.
#[derive(ThisError, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum ApplicationError {
    #[error("Bad Request: {}", .message)]
    BadRequest {
        message: String,
        subtype: Option<String>,
    },
    #[error("Internal Server Error: {}", .message)]
    InternalServerError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Not Found: {}", .message)]
    NotFound {
        message: String,
        subtype: Option<String>,
    },
}

impl From<anyhow::Error> for ApplicationError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<ApplicationError>() {
            Some(relay_error) => relay_error.clone(),
            None => ApplicationError::InternalServerError {
                message: error.to_string(),
                subtype: None,
            },
        }
    }
}

impl ApplicationError {
    pub fn not_found(message: &str, subtype: Option<&str>) -> RelayError {
        RelayError::application(ApplicationError::NotFound {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string().snake_case()),
        })
    }
}

impl ErrorMeta for ApplicationError {
    fn code(&self) -> ErrorCode {
        match self {
            ApplicationError::BadRequest { .. } => ErrorCode(2000),
            ApplicationError::InternalServerError { .. } => ErrorCode(2003),
            ApplicationError::NotFound { .. } => ErrorCode(2005),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            ApplicationError::BadRequest { subtype, .. } => {
                ErrorKey::application("bad_request", subtype.as_deref())
            }
            ApplicationError::InternalServerError { subtype, .. } => {
                ErrorKey::application("internal_server_error", subtype.as_deref())
            }
            ApplicationError::NotFound { subtype, .. } => {
                ErrorKey::application("not_found", subtype.as_deref())
            }
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            ApplicationError::BadRequest { message, .. }
            | ApplicationError::InternalServerError { message, .. }
            | ApplicationError::NotFound { message, .. } => {
                ErrorMessage(message.to_string())
            }
        }
    }
}

impl Debug for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n", &self)?;
        let mut current = self.source();
        while let Some(cause) = current {
            writeln!(f, "Caused by:\n\t{}", cause)?;
            current = cause.source();
        }
        Ok(())
    }
}

impl From<InternalError> for ApplicationError {
    fn from(error: InternalError) -> Self {
        match error {
            InternalError::ConnectionError { .. }
            | InternalError::IOErr { .. }
            | InternalError::ConfigurationError { .. }
            | InternalError::UnknownError { .. } => ApplicationError::InternalServerError {
                message: "An unknown error occurred".into(),
                subtype: None,
            },
            InternalError::InvalidArgument { message, subtype }
            | InternalError::SerializeError { message, subtype }
            | InternalError::DeserializeError { message, subtype }
            | InternalError::TemplateSubstitutionError { message, subtype }
            | InternalError::CycleDetected { message, subtype } => {
                ApplicationError::BadRequest { message, subtype }
            }
        }
    }
}

#[derive(ThisError, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum RelayError {
    Internal(InternalError),
    Application(ApplicationError),
}

impl AsRef<str> for RelayError {
    fn as_ref(&self) -> &str {
        match self {
            RelayError::Internal(e) => e.as_ref(),
            RelayError::Application(e) => e.as_ref(),
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<RelayError>() {
            Some(relay_error) => relay_error.clone(),
            None => RelayError::Internal(InternalError::UnknownError {
                message: error.to_string(),
                subtype: None,
            }),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() || error.is_syntax() || error.is_eof() {
            InternalError::deserialize_error(&error.to_string(), None)
        } else {
            InternalError::serialize_error(&error.to_string(), None)
        }
    }
}

impl<'a> From<&'a RelayError> for StatusCode {
    fn from(value: &'a RelayError) -> Self {
        match value {
            RelayError::Internal(e) => match e {
                InternalError::ConnectionError { .. } => StatusCode::BAD_GATEWAY,
                InternalError::InvalidArgument { .. }
                | InternalError::SerializeError { .. }
                | InternalError::DeserializeError { .. }
                | InternalError::TemplateSubstitutionError { .. }
                | InternalError::CycleDetected { .. } => StatusCode::BAD_REQUEST,
                InternalError::UnknownError { .. }
                | InternalError::IOErr { .. }
                | InternalError::ConfigurationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RelayError::Application(e) => match e {
                ApplicationError::BadRequest { .. } => StatusCode::BAD_REQUEST,
                ApplicationError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ApplicationError::NotFound { .. } => StatusCode::NOT_FOUND,
            },
        }
    }
}

impl From<RelayError> for StatusCode {
    fn from(value: RelayError) -> Self {
        (&value).into()
    }
}

impl RelayError {
    fn internal(internal: InternalError) -> Self {
        RelayError::Internal(internal)
    }

    fn application(application: ApplicationError) -> Self {
        RelayError::Application(application)
    }

    pub fn as_application(&self) -> RelayError {
        match self {
            RelayError::Application(e) => RelayError::Application(e.clone()),
            RelayError::Internal(e) => RelayError::Application(e.clone().into()),
        }
    }

    pub fn as_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "type": self.as_ref(),
                "code": self.code().as_u16(),
                "status": StatusCode::from(self).as_u16(),
                "key": self.key().to_string(),
                "message": self.message().to_string()
            }
        })
    }

    pub fn is_template_substitution(&self) -> bool {
        matches!(
            self,
            RelayError::Internal(InternalError::TemplateSubstitutionError { .. })
        )
    }
}

impl ErrorMeta for RelayError {
    fn code(&self) -> ErrorCode {
        match self {
            RelayError::Internal(e) => e.code(),
            RelayError::Application(e) => e.code(),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            RelayError::Internal(e) => e.key(),
            RelayError::Application(e) => e.key(),
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            RelayError::Internal(e) => e.message(),
            RelayError::Application(e) => e.message(),
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RelayError::Internal(e) => write!(f, "{}", e),
            RelayError::Application(e) => write!(f, "{}", e),
        }
    }
}
