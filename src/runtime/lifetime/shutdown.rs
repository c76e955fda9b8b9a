use tokio::signal;
use tracing::{error, warn};

/// 等待 Ctrl+C 信号
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        // 无法监听信号时保持挂起，由服务器自身退出
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}
