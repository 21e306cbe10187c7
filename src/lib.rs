//! Terminal guestbook: fill in a review and post it to a configured endpoint.

pub mod app;
pub mod config;
pub mod error;
pub mod form_state;
pub mod guestbook_entry;
pub mod image;
pub mod input;
pub mod telemetry;
pub mod transport;
pub mod ui;
