//! 联系人与发送任务

use std::fmt::Display;

/// 单个联系人
///
/// 由联系人解析器按源文件顺序生成，之后只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    /// 显示名称，用于替换模板中的 `{nome}`
    pub display_name: String,
    /// 原始电话字段（未加区号）
    pub raw_phone: String,
    /// 在非空行中的序号（从1开始）
    pub line_index: usize,
}

impl ContactRecord {
    pub fn new(
        display_name: impl Into<String>,
        raw_phone: impl Into<String>,
        line_index: usize,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            raw_phone: raw_phone.into(),
            line_index,
        }
    }
}

impl Display for ContactRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第{}行 {} ({})]",
            self.line_index, self.display_name, self.raw_phone
        )
    }
}

/// 联系人文件的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSource {
    pub contacts: Vec<ContactRecord>,
    /// 非空行总数，包括字段不足被跳过的行
    pub line_count: usize,
}

/// 一次发送任务：有序联系人 + 消息模板
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub contacts: Vec<ContactRecord>,
    pub message_template: String,
    /// 进度 `(i/N)` 中的 `N`
    pub source_lines: usize,
}

impl DispatchJob {
    /// 直接由联系人列表创建，`source_lines` 取最大行号
    pub fn new(contacts: Vec<ContactRecord>, message_template: impl Into<String>) -> Self {
        let source_lines = contacts.iter().map(|c| c.line_index).max().unwrap_or(0);
        Self {
            contacts,
            message_template: message_template.into(),
            source_lines,
        }
    }

    pub fn from_source(source: ContactSource, message_template: impl Into<String>) -> Self {
        Self {
            contacts: source.contacts,
            message_template: message_template.into(),
            source_lines: source.line_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_from_contacts_counts_up_to_last_line() {
        let job = DispatchJob::new(
            vec![
                ContactRecord::new("Ana", "11999", 1),
                ContactRecord::new("Carla", "11888", 3),
            ],
            "{nome}",
        );
        assert_eq!(job.source_lines, 3);
        assert_eq!(DispatchJob::new(Vec::new(), "{nome}").source_lines, 0);
    }
}
