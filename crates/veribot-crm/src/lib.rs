pub mod adapter;
pub mod error;
pub mod espocrm;
pub mod hubspot;
pub mod notes;
pub mod summarizer;
pub mod types;

pub use adapter::CrmAdapter;
pub use error::{CrmError, Result};
pub use espocrm::EspoCrmAdapter;
pub use hubspot::HubSpotAdapter;
pub use summarizer::SummarizerAndSync;
pub use types::{ContactInfo, ContactPayload, ConversationSummary};
