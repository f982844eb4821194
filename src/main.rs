use anyhow::Result;
use journal_subscription::utils::logging;
use journal_subscription::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置（缺少凭证时直接退出）
    let config = Config::load_validated()?;

    // 初始化并运行应用
    let app = App::new(&config);
    app.run().await?;

    Ok(())
}
