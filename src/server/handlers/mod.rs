//! HTTP request handlers.

mod account;
mod billing;
mod documents;

pub use account::{account, health};
pub use billing::billing_event;
pub use documents::{
    analyze_document, delete_document, document_results, list_documents, upload_document,
};
