use crate::domain::types::BinId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Severity - 问题级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

// ==========================================
// CheckKind - 检查项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Quantity,
    Priority,
    BinCapacity,
    EmptyCompartment,
    CompartmentCount,
    StackLookup,
    DataType,
    Orphaned,
    Health,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Quantity => "quantity",
            CheckKind::Priority => "priority",
            CheckKind::BinCapacity => "bin_capacity",
            CheckKind::EmptyCompartment => "empty_compartment",
            CheckKind::CompartmentCount => "compartment_count",
            CheckKind::StackLookup => "stack_lookup",
            CheckKind::DataType => "data_type",
            CheckKind::Orphaned => "orphaned",
            CheckKind::Health => "health",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ConsistencyIssue - 单条问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub check: CheckKind,
    pub severity: Severity,
    pub message: String,
    pub sku: Option<String>,
    pub bin_id: Option<BinId>,
}

impl ConsistencyIssue {
    pub fn error(check: CheckKind, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Error,
            message: message.into(),
            sku: None,
            bin_id: None,
        }
    }

    pub fn warning(check: CheckKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(check, message)
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_bin(mut self, bin_id: BinId) -> Self {
        self.bin_id = Some(bin_id);
        self
    }
}

// ==========================================
// ConsistencyReport - 检查报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// 检查时机 (如 "initial" / "iteration 500" / "final")
    pub context: String,
    /// 无 Error 级问题
    pub all_passed: bool,
    pub checks_run: Vec<CheckKind>,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            all_passed: true,
            checks_run: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// 记录一项检查的结果
    pub fn record(&mut self, check: CheckKind, issues: Vec<ConsistencyIssue>) {
        self.checks_run.push(check);
        if issues.iter().any(|i| i.severity == Severity::Error) {
            self.all_passed = false;
        }
        self.issues.extend(issues);
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }

    /// 指定检查项的问题
    pub fn issues_of(&self, check: CheckKind) -> impl Iterator<Item = &ConsistencyIssue> {
        self.issues.iter().filter(move |i| i.check == check)
    }

    /// 一行摘要, 用于日志与导出
    pub fn summary_line(&self) -> String {
        if self.all_passed {
            format!(
                "[{}] 一致性检查通过 ({} 项检查, {} 条警告)",
                self.context,
                self.checks_run.len(),
                self.warning_count()
            )
        } else {
            format!(
                "[{}] 一致性检查失败: {} 条错误, {} 条警告",
                self.context,
                self.error_count(),
                self.warning_count()
            )
        }
    }
}
