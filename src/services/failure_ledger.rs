//! 失败记录 - 业务能力层
//!
//! 只负责按顺序收集失败的联系人，不影响发送流程

use std::fmt::Display;

use crate::models::ContactRecord;

/// 单个联系人的失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub display_name: String,
    pub raw_phone: String,
    pub error_message: String,
}

impl Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "- {} ({}): {}",
            self.display_name, self.raw_phone, self.error_message
        )
    }
}

/// 失败记录簿
///
/// 只追加，不去重，不重排。
#[derive(Debug, Default, Clone)]
pub struct FailureLedger {
    records: Vec<FailureRecord>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条失败记录
    pub fn record(&mut self, contact: &ContactRecord, error: impl Display) {
        self.records.push(FailureRecord {
            display_name: contact.display_name.clone(),
            raw_phone: contact.raw_phone.clone(),
            error_message: error.to_string(),
        });
    }

    /// 按插入顺序返回全部记录
    pub fn all(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<FailureRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_insertion_order_and_duplicates() {
        let ana = ContactRecord::new("Ana", "11999", 1);
        let carla = ContactRecord::new("Carla", "11888", 3);

        let mut ledger = FailureLedger::new();
        ledger.record(&carla, "timeout");
        ledger.record(&ana, "invalid number");
        ledger.record(&carla, "timeout");

        let names: Vec<_> = ledger.all().iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Carla", "Ana", "Carla"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_failure_record_report_line() {
        let mut ledger = FailureLedger::new();
        ledger.record(&ContactRecord::new("Carla", "11888", 3), "empty phone number");

        assert_eq!(
            ledger.all()[0].to_string(),
            "- Carla (11888): empty phone number"
        );
    }
}
