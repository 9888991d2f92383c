//! Outbound notification seam.
//!
//! Token issuance hands plaintext tokens to a [`Mailer`] on a background
//! task. Transport and template rendering live behind the trait; the
//! default [`LogMailer`] only logs what would have been sent.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, error, info};

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Render `template` with `data` and deliver it to `recipient`.
    async fn send_templated(&self, recipient: &str, template: &str, data: Value) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    #[must_use]
    pub const fn new(sender: String) -> Self {
        Self { sender }
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send_templated(&self, recipient: &str, template: &str, data: Value) -> Result<()> {
        info!(
            from = %self.sender,
            to = %recipient,
            template = %template,
            payload = %data,
            "mail send stub"
        );
        Ok(())
    }
}

/// Sends on its own task. A failed send is logged and otherwise ignored.
pub fn deliver_in_background(
    mailer: Arc<dyn Mailer>,
    recipient: String,
    template: &'static str,
    data: Value,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            if let Err(e) = mailer.send_templated(&recipient, template, data).await {
                error!(template = %template, error = %e, "Failed to deliver mail");
            }
        }
        .instrument(Span::current()),
    )
}
