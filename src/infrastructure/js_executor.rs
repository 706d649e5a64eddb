//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 导航 / 关闭"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ChannelError;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 不认识联系人 / 模板
/// - 不处理发送流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, ChannelError> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.into_value()?)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, ChannelError> {
        let json_value = self.eval(js_code).await?;
        Ok(serde_json::from_value(json_value)?)
    }

    /// 导航到指定地址
    pub async fn goto(&self, url: &str) -> Result<(), ChannelError> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// 关闭页面
    pub async fn close(&self) -> Result<(), ChannelError> {
        self.page.clone().close().await?;
        Ok(())
    }
}
