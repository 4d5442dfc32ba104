#![deny(unsafe_code)]

/// Chat application shell and components.
///
/// This crate provides a desktop chat client built with GPUI and
/// gpui-component: a message panel with a typing placeholder, a composer,
/// and a teach-back prompt for questions the bot service could not answer.
pub mod app;
/// Chat domain contracts shared across UI modules.
pub mod chat;
/// Settings persistence.
pub mod settings;
/// Returns a stable marker used by integration smoke tests.
pub fn smoke_marker() -> &'static str {
    "banter"
}
