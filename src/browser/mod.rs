pub mod connection;
pub mod launch;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser_and_page;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

/// 按配置获取 WhatsApp Web 页面
///
/// 设置了调试端口时连接已打开的浏览器，否则自行启动一个有界面的浏览器。
pub async fn open_session_page(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser_and_page(port, &config.target_url).await,
        None => launch_browser_and_page(config).await,
    }
}
