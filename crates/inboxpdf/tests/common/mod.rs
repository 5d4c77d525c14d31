//! Shared test utilities for inboxpdf integration tests.
//!
//! This module provides:
//! - `MockMailbox`, an in-memory `MailSession` with read flags, UIDs and
//!   injectable failures
//! - `MessageBuilder` for raw RFC 822 messages
//! - `TestHarness` for running a harvester against temp directories

pub mod builders;
pub mod harness;
pub mod mock_mailbox;

pub use builders::*;
pub use harness::TestHarness;
pub use mock_mailbox::{MockMailbox, MockMessage};
