use std::path::Path;

use anyhow::Result;
use bulk_sender::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置：BULK_SENDER_CONFIG 指向 TOML 文件时优先使用
    let config = match std::env::var("BULK_SENDER_CONFIG") {
        Ok(path) => Config::load(Path::new(&path))?,
        Err(_) => Config::from_env()?,
    };

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
