//! 消息模板渲染

/// 模板中唯一识别的占位符
pub const NAME_PLACEHOLDER: &str = "{nome}";

/// 将模板中所有 `{nome}` 替换为联系人姓名
///
/// 纯函数；模板中没有占位符时原样返回。
pub fn render(template: &str, display_name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, display_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        assert_eq!(render("Hi {nome}, bye {nome}", "Ana"), "Hi Ana, bye Ana");
    }

    #[test]
    fn test_render_without_placeholder_is_unchanged() {
        assert_eq!(render("Promoção hoje!", "Ana"), "Promoção hoje!");
    }

    #[test]
    fn test_render_ignores_other_tokens() {
        assert_eq!(
            render("{Nome} {telefone} {nome}", "Bia"),
            "{Nome} {telefone} Bia"
        );
    }
}
