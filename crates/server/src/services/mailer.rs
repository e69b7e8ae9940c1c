// Outbound notification seam. Delivery itself lives outside this service;
// the default implementation records the message in the log.

use std::sync::Arc;

pub type DynMailer = Arc<dyn Mailer>;

pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: String) -> Self {
        Self { from }
    }
}

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(from = %self.from, %to, %subject, %body, "notification email");
        Ok(())
    }
}
