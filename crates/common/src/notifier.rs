use async_trait::async_trait;

/// Operator channel. Delivery is best-effort: implementations log their
/// own failures and never hand them back to the trading loop.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}
