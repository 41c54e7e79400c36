//! Relational store for users, lesson content and learner progress
//!
//! All tables live in one SQLite database. Every public operation is a single
//! statement or a short transaction; nothing is cached in memory.

mod catalog;
mod database;
mod models;
mod quizzes;
mod review;
mod users;

pub use database::{Database, Result, StorageError};
pub use models::*;
