use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot resolve video source: {0}")]
    IdentifierResolution(String),

    #[error("Engine failed to start: {0}")]
    EngineInit(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session controller disconnected")]
    ControllerClosed,

    #[error("Session has been torn down")]
    SessionDestroyed,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
