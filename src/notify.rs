use async_trait::async_trait;
use tracing::info;

/// Outbound notification collaborator. Password reset mail is triggered here;
/// actual delivery lives outside this service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_password_reset(&self, email: &str) -> anyhow::Result<()>;
}

/// Logs the hand-off instead of delivering anything.
#[derive(Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_password_reset(&self, email: &str) -> anyhow::Result<()> {
        info!(email = %email, "password reset notification handed off");
        Ok(())
    }
}
