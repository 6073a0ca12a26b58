//! Logged-in identity lookup — shared between desktop and CLI.
//!
//! The sync client records one file per logged-in identity. This crate only
//! reads them: it answers "who is logged in", and reports ambiguity when
//! more than one identity is active. Logging in and out is the sync
//! client's business.

mod identity;
mod registry;

pub use identity::{Identity, SessionError, SessionRegistry};
pub use registry::FileSessionRegistry;
