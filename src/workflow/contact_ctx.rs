//! 联系人处理上下文
//!
//! 封装"我正在发第几个联系人"这一信息

use std::fmt::Display;

#[derive(Debug, Clone, Copy)]
pub struct ContactCtx {
    /// 在联系人列表中的位置（从1开始）
    pub position: usize,
    /// 联系人总数
    pub total: usize,
    /// 源文件中的非空行号
    pub line_index: usize,
    /// 源文件非空行总数
    pub source_lines: usize,
}

impl ContactCtx {
    pub fn new(position: usize, total: usize, line_index: usize, source_lines: usize) -> Self {
        Self {
            position,
            total,
            line_index,
            source_lines,
        }
    }

    /// 后面是否还有联系人（按联系人列表，不按行）
    pub fn has_more(&self) -> bool {
        self.position < self.total
    }
}

impl Display for ContactCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 {}/{}]", self.line_index, self.source_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more_ignores_skipped_lines() {
        // 第3行是最后一个联系人，后面只剩字段不足的行
        let ctx = ContactCtx::new(2, 2, 3, 4);
        assert!(!ctx.has_more());
        assert_eq!(ctx.to_string(), "[行 3/4]");

        assert!(ContactCtx::new(1, 2, 1, 4).has_more());
    }
}
