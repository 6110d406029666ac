pub mod antiflutter;
pub mod telegram;

use anyhow::Result;

/// Delivery sink for composed alert text. Retries, if any, are the sink's concern.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Logs instead of delivering. Used when no channel is configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        tracing::info!(target: "notify", %message, "alert (no delivery channel configured)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
