//! 遥测来源 trait

use std::sync::Arc;

use contracts::FeedEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::config::IngestionMetrics;

/// 遥测来源 trait
///
/// 回放与模拟来源都实现此 trait，负责：
/// 1. 生成或读取 `FeedEvent`
/// 2. 按记录的节奏发送到通道
/// 3. 更新共享的 ingestion 指标
pub trait FeedSource: Send + Sync {
    /// 来源名称
    fn name(&self) -> &str;

    /// 来源类型 (replay / mock)
    fn kind(&self) -> &'static str;

    /// 启动发送任务
    ///
    /// 通道关闭或调用 `stop` 后任务结束。重复调用不会启动第二个任务。
    fn start(
        &self,
        tx: mpsc::Sender<FeedEvent>,
        metrics: Arc<IngestionMetrics>,
    ) -> Option<JoinHandle<()>>;

    /// 停止发送
    fn stop(&self);

    /// 是否正在发送
    fn is_running(&self) -> bool;
}

/// 发送一个事件，通道关闭时返回 false
pub(crate) async fn send_event(
    tx: &mpsc::Sender<FeedEvent>,
    event: FeedEvent,
    metrics: &IngestionMetrics,
    source: &str,
) -> bool {
    let kind = event.kind();
    if tx.send(event).await.is_err() {
        metrics.record_dropped();
        tracing::debug!(source = %source, "feed channel closed");
        return false;
    }

    metrics.record_sent();
    metrics.update_queue_len(tx.max_capacity() - tx.capacity());
    metrics::counter!("ingestion_events_total", "source" => source.to_string(), "kind" => kind)
        .increment(1);
    trace!(source = %source, kind, "feed event sent");
    true
}
