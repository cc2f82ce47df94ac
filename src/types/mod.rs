// Public modules
pub mod chat_event;
pub mod chat_request;
pub mod conversation;
pub mod cost_report;
pub mod message_role;
pub mod message_view;
pub mod usage_snapshot;

// Re-exports
pub use chat_event::ChatEvent;
pub use chat_request::{ChatRequest, DEFAULT_MODEL, JobFitRequest};
pub use conversation::{Conversation, ConversationCreate, ConversationRef, filter_conversations};
pub use cost_report::{CumulativeCost, DailyCost, MonthlyCost, cumulative_daily_totals};
pub use message_role::MessageRole;
pub use message_view::{MessageContent, MessageView, ViewId};
pub use usage_snapshot::UsageSnapshot;
