use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};
use crate::models::contact::{ContactRecord, ContactSource};

/// 字段分隔符
pub const FIELD_DELIMITER: char = ';';

/// 将原始文本解析为有序联系人列表
///
/// - 按任意换行符拆分，去掉空白行
/// - 每行按 `;` 拆分，少于两个字段的行直接跳过（不算失败）
/// - 第0个字段为姓名，第1个字段为电话，均去除首尾空白（姓名可以为空）
/// - `line_index` 为非空行序号（从1开始），`line_count` 为非空行总数
pub fn parse_contacts(raw: &str) -> ContactSource {
    let lines: Vec<&str> = raw
        .split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .collect();

    let contacts = lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_index = index + 1;
            let mut fields = line.split(FIELD_DELIMITER);
            let (Some(name), Some(phone)) = (fields.next(), fields.next()) else {
                debug!("第 {} 行字段不足，跳过: {}", line_index, line);
                return None;
            };
            Some(ContactRecord::new(name.trim(), phone.trim(), line_index))
        })
        .collect();

    ContactSource {
        contacts,
        line_count: lines.len(),
    }
}

/// 读取联系人文件并解析
///
/// 文件无法读取时返回 [`DispatchError::SourceRead`]，整个任务在发送前中止。
pub async fn load_contacts(path: &Path) -> DispatchResult<ContactSource> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| DispatchError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

    let source = parse_contacts(&content);
    debug!(
        "已解析联系人文件 {}: {} 行, {} 个联系人",
        path.display(),
        source.line_count,
        source.contacts.len()
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_lines_without_phone_field() {
        let source = parse_contacts("Ana;11999\nBob\nCarla;11888");

        // Bob 仍计入非空行
        assert_eq!(source.line_count, 3);
        assert_eq!(
            source.contacts,
            vec![
                ContactRecord::new("Ana", "11999", 1),
                ContactRecord::new("Carla", "11888", 3),
            ]
        );
    }

    #[test]
    fn test_parse_handles_crlf_and_blank_lines() {
        let source = parse_contacts("\r\n  Ana ; 11999 \r\n\r\n   \nBruno;21988;extra\r\n");
        let contacts = source.contacts;

        assert_eq!(source.line_count, 2);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0], ContactRecord::new("Ana", "11999", 1));
        // 空白行不计入行号
        assert_eq!(contacts[1], ContactRecord::new("Bruno", "21988", 2));
    }

    #[test]
    fn test_parse_keeps_empty_fields() {
        let contacts = parse_contacts("Ana;\n;11777").contacts;

        assert_eq!(contacts[0], ContactRecord::new("Ana", "", 1));
        assert_eq!(contacts[1], ContactRecord::new("", "11777", 2));
    }

    #[test]
    fn test_line_count_includes_trailing_nameless_line() {
        let source = parse_contacts("Ana;11999\nBob\nCarla;11888\n;11777");

        assert_eq!(source.line_count, 4);
        let indexes: Vec<usize> = source.contacts.iter().map(|c| c.line_index).collect();
        assert_eq!(indexes, [1, 3, 4]);
        assert_eq!(source.contacts[2].display_name, "");
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_contacts(""), ContactSource::default());
        assert_eq!(parse_contacts("\n\n  \n"), ContactSource::default());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_source_read_error() {
        let err = load_contacts(Path::new("no/such/contatos.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::SourceRead { .. }));
        // 状态文本不带路径，路径只写日志
        let message = err.to_string();
        assert!(message.starts_with("Error reading file: "), "{}", message);
        assert!(!message.contains("contatos.csv"));
    }
}
