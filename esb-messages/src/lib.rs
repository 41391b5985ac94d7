//! esb-messages
//!
//! User-facing message templates for the esb CLI and the builder that fills them in.

pub mod builder;
pub mod macros;
pub mod messages;

pub use messages::MESSAGES;
