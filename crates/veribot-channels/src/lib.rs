pub mod adapter;
pub mod error;
pub mod types;

pub use adapter::ChannelAdapter;
pub use error::{ChannelError, Result};
pub use types::{Attachment, Channel, EventKind, InboundEvent, OutboundMessage, SenderInfo};
