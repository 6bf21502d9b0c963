//! Core business logic for dugit

pub mod config;
pub mod discovery;
pub mod lock;
pub mod model;
pub mod session;

pub use config::DugitConfig;
pub use model::{Branch, Model, Remote};
pub use session::{Session, SessionError, SessionOptions, SessionState};
