//! Route handlers for the JSON API
//!
//! Each handler takes the shared [`AppState`](crate::server::AppState), the
//! caller's [`Session`] where one is needed, and returns `Json` or an
//! [`ApiError`]. Database guards are always dropped before awaiting.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod generation;
pub mod quizzes;
pub mod review;
pub mod session;

pub use error::{ApiError, ApiResult};
pub use session::{Session, USER_ID_HEADER};
