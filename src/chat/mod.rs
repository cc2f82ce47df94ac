//! Chat session control for one conversation view.
//!
//! This module drives the send/edit/receive loop against the cvbot server:
//!
//! - Streaming replies rendered incrementally as tokens arrive
//! - Inline editing of earlier user messages, with rollback on failure
//! - A live daily usage meter
//! - A terminal front end with slash commands
//!
//! # Architecture
//!
//! - [`session`]: [`ChatSessionController`], the state machine behind a view
//! - [`view`]: the [`ChatView`] callbacks a surface implements
//! - [`render`]: [`TerminalView`], a `ChatView` that prints to a terminal
//! - [`commands`]: Slash command parsing
//! - [`config`]: CLI argument parsing and configuration

pub mod commands;
pub mod config;
pub mod render;
pub mod session;
pub mod view;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::TerminalView;
pub use session::{
    ChatSessionController, HistoryEntry, SendOutcome, SendState, StreamAccumulator,
};
pub use view::ChatView;
