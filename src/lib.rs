// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod sections;
pub mod sse;
pub mod transport;
pub mod types;
pub mod usage;
pub mod utils;

// Re-exports
pub use client::CvBot;
pub use client_logger::ChatLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{HtmlRenderer, MarkdownRenderer};
pub use sections::{Section, Sections, layout_fit_report, split_sections};
pub use sse::process_sse;
pub use transport::{ByteStream, ChatTransport};
pub use types::*;
pub use usage::UsageDisplay;
