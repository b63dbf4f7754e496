use async_trait::async_trait;
use common::OtpPurpose;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification channel is not configured")]
    NotConfigured,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound messages to users: OTP mails and device push notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a one-time code to `email`.
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose)
    -> Result<(), NotifyError>;

    /// Push a message to every device token. Returns how many were accepted.
    async fn push(&self, tokens: &[String], title: &str, message: &str)
    -> Result<usize, NotifyError>;
}

/// Writes every outbound message to the log instead of a real transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), NotifyError> {
        tracing::info!(%email, %purpose, "Sending OTP");
        tracing::debug!(%email, %code, "OTP code");
        Ok(())
    }

    async fn push(
        &self,
        tokens: &[String],
        title: &str,
        message: &str,
    ) -> Result<usize, NotifyError> {
        tracing::info!(
            recipients = tokens.len(),
            %title,
            message_len = message.len(),
            "Pushing notification"
        );
        Ok(tokens.len())
    }
}
