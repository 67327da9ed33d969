use crate::traits::ProgressSink;
use async_trait::async_trait;
use tracing::info;

/// Sink for callers that have nowhere to surface progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn report_progress(&self, _fraction: f32, _message: &str) {}

    async fn info(&self, _message: &str) {}

    async fn resource_list_changed(&self) {}
}

/// Sink that forwards milestones to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressSink;

#[async_trait]
impl ProgressSink for TracingProgressSink {
    async fn report_progress(&self, fraction: f32, message: &str) {
        info!(progress = f64::from(fraction), "{message}");
    }

    async fn info(&self, message: &str) {
        info!("{message}");
    }

    async fn resource_list_changed(&self) {
        info!("resource list changed");
    }
}
