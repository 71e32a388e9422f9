//! Use-case services for the to-do app.
//!
//! # Responsibility
//! - Orchestrate repository, reminder and file store calls into
//!   use-case level APIs.
//! - Keep FFI callers decoupled from storage details.

pub mod attachment_service;
pub mod reminder_service;
pub mod settings_service;
pub mod task_service;
