use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;

/// 启动有界面的浏览器并打开 WhatsApp Web
///
/// 使用固定的用户数据目录，登录状态在两次运行之间保留。
pub async fn launch_browser_and_page(config: &Config) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器...");
    debug!("用户数据目录: {}", config.browser_user_data_dir.display());

    let mut builder = BrowserConfig::builder()
        .with_head()
        .user_data_dir(&config.browser_user_data_dir)
        .args(vec!["--no-sandbox", "--disable-setuid-sandbox"]);
    if let Some(executable) = &config.browser_executable {
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(config.target_url.as_str()).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 浏览器已打开: {}", config.target_url);
    Ok((browser, page))
}
