use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use pingpong_engine::LiveMatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<LiveMatchError> for ServerError {
    fn from(e: LiveMatchError) -> Self {
        match e {
            LiveMatchError::MatchNotFound(id) => Self::NoRecordFound(format!("Match {id} does not exist")),
            LiveMatchError::Scoring(e) => Self::InvalidRequestBody(e.to_string()),
            e => Self::BackendError(e.to_string()),
        }
    }
}

/// Errors that end a WebSocket command loop, or that are reported back to the client that caused them.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not understand the command. {0}")]
    InvalidCommand(String),
    #[error(transparent)]
    Backend(#[from] LiveMatchError),
}

impl SessionError {
    /// True if the error was caused by the client's request and should be reported to it as an `error` envelope.
    /// Anything else is a backend failure that terminates the session.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidCommand(_) => true,
            Self::Backend(e) => e.is_validation(),
        }
    }
}
