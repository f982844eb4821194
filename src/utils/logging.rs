/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// 初始化日志
///
/// 默认级别 info，可通过 `RUST_LOG` 覆盖
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `model`: 使用的 LLM 模型
pub fn log_startup(model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 期刊订阅推送开始");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 LLM 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录订阅加载信息
pub fn log_subscriptions_loaded(total: usize) {
    info!("✓ 找到 {} 个启用的订阅", total);
}

/// 打印最终统计信息
///
/// # 参数
/// - `succeeded`: 成功处理的订阅数
/// - `failed`: 失败的订阅数
/// - `articles`: 写入的文章数
/// - `summaries`: 写入的小结数
pub fn print_final_stats(succeeded: usize, failed: usize, articles: usize, summaries: usize) {
    let total = succeeded + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", succeeded, total);
    info!("❌ 失败: {}", failed);
    info!("📄 推送文章: {} 篇", articles);
    info!("📝 生成小结: {} 份", summaries);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
