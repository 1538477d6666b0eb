pub mod hierarchy;
pub mod index;
pub mod mime;
pub mod reply;
pub mod store;
pub mod transfer;
pub mod types;

pub use hierarchy::build_hierarchy;
pub use index::{IndexError, MailIndex, NotmuchIndex};
pub use mime::{MimeNode, RenderError};
pub use reply::{ComposeDraft, build_reply_draft, reply_subject};
pub use store::{FileStore, MessageStore, ParsedMessage, StoreError};
pub use transfer::{CommandTransfer, MailTransfer, TransferError};
pub use types::{HierarchyNode, MessageData, MessageRef, ThreadSummary};
