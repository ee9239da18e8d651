mod contact;
mod identity;

pub use contact::{Contact, ContactId, LinkPrecedence, NewContact};
pub use identity::ConsolidatedIdentity;
