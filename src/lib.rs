//! # Mailer Integration Library
//!
//! A transactional mailer core that builds a canonical email message
//! through a fluent, validated API and converts it into provider-specific
//! payloads:
//! - Schema-driven field validation and normalization
//! - A uniform accumulation policy for repeated field writes
//! - Declarative, data-driven conversion rules (source path, customiser,
//!   destination path) per provider
//! - Provider payload shapes for SMTP (pass-through), Mandrill, and Mailjet
//! - A transport boundary with per-provider option validation, readiness
//!   checks, timing stats, and a sandbox decorator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use integrations_mailer::{Mailer, MailjetOptions, TransportOptions};
//! use integrations_mailer::mocks::MockTransportFactory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Wire rules and transports once; collaborators are explicit.
//!     let mailer = Mailer::new(Arc::new(MockTransportFactory::new()))?;
//!
//!     // Build the canonical message; every setter reports acceptance.
//!     let mut message = mailer.message();
//!     assert!(message.set_from("sender@example.com"));
//!     assert!(message.add_to("recipient@example.com"));
//!     assert!(message.set_subject("Hello from Rust!"));
//!     assert!(message.set_message("<b>This is a test email.</b>"));
//!
//!     // Freeze, convert, and send.
//!     let options = TransportOptions::Mailjet(MailjetOptions::new("public", "private"));
//!     let outcome = message.prepare().to_mailjet().send(&options).await?;
//!     println!("sent in {}s {}ms", outcome.stats.seconds, outcome.stats.milliseconds);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod paths;

// Validation pipeline
pub mod check;
pub mod schema;
pub mod transform;

// Canonical message
pub mod message;

// Conversion
pub mod convert;
pub mod customise;
pub mod rules;

// Delivery boundary
pub mod sender;
pub mod transport;

// Composition root
pub mod mailer;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use config::{MailjetOptions, MandrillOptions, SmtpAuth, SmtpOptions, TransportOptions};
pub use convert::Converter;
pub use customise::{Customiser, PostCustomiser};
pub use errors::{MailerError, MailerErrorKind, MailerResult};
pub use mailer::Mailer;
pub use message::{AddressInput, Message, MessageBuilder};
pub use rules::{ProviderRules, Rule, RuleSet};
pub use sender::{SendOutcome, SendState, SendStats, Sender};
pub use transport::{Provider, SandboxTransport, Transport, TransportFactory};
