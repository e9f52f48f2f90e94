use async_trait::async_trait;

/// Delivers one-time codes to a phone number.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send_sms(&self, phone_number: &str, message: &str) -> anyhow::Result<()>;
}

/// Writes the message to the log instead of an SMS gateway.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send_sms(&self, phone_number: &str, message: &str) -> anyhow::Result<()> {
        tracing::info!("📱 SMS to {}: {}", phone_number, message);
        Ok(())
    }
}
