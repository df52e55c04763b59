// Library entry shared by the replay binary in src/main.rs and the
// integration tests

#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod player;
pub mod replay;
pub mod services;
pub mod session;
pub mod utils;


pub use config::Config;
pub use session::{LoadRequest, SessionController, SessionEvent, SessionHandle, spawn_session};
pub use utils::{SessionError, SessionResult};
