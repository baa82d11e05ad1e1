//! Outbound mail through the user's own Gmail mailbox.
//!
//! `address` cleans recipients, `transport` talks to Google (token refresh
//! and SMTP), `dispatch` runs single and batch sends, `pacing` spaces out
//! batch sends, `upload` stages the optional resume attachment.

pub mod address;
pub mod dispatch;
pub mod handlers;
pub mod pacing;
pub mod transport;
pub mod upload;

pub use dispatch::{dispatch, dispatch_batch, BatchReport, MailRequest};
pub use pacing::{FixedDelay, SendPacer};
pub use transport::{GmailMailer, Mailer, MailboxAccount};
pub use upload::UploadedFile;
