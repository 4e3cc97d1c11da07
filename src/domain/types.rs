// ==========================================
// 料箱仓储仿真系统 - 领域类型定义
// ==========================================
// 格口规格 / 适配状态 / 料箱型号 / 单位制 / 订单行结局
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 料箱 ID
pub type BinId = i64;

/// 料箱堆 ID
pub type StackId = i64;

// ==========================================
// 格口规格 (Compartment Size)
// ==========================================
// 一个料箱可整箱使用, 或等分为 2/4/8 个格口
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompartmentSize {
    Eighth,  // 1/8 箱
    Quarter, // 1/4 箱
    Half,    // 1/2 箱
    Whole,   // 整箱
}

impl CompartmentSize {
    /// 从小到大的全部规格
    pub const ALL: [CompartmentSize; 4] = [
        CompartmentSize::Eighth,
        CompartmentSize::Quarter,
        CompartmentSize::Half,
        CompartmentSize::Whole,
    ];

    /// 占整箱的比例 (1, 0.5, 0.25, 0.125)
    pub fn fraction(self) -> f64 {
        match self {
            CompartmentSize::Whole => 1.0,
            CompartmentSize::Half => 0.5,
            CompartmentSize::Quarter => 0.25,
            CompartmentSize::Eighth => 0.125,
        }
    }

    /// 每个料箱的格口数 (= 1 / fraction)
    pub fn compartments_per_bin(self) -> u32 {
        match self {
            CompartmentSize::Whole => 1,
            CompartmentSize::Half => 2,
            CompartmentSize::Quarter => 4,
            CompartmentSize::Eighth => 8,
        }
    }

    /// 按比例值识别规格, 非法值返回 None
    pub fn from_fraction(value: f64) -> Option<Self> {
        CompartmentSize::ALL
            .into_iter()
            .find(|size| (size.fraction() - value).abs() < f64::EPSILON)
    }

    /// 按每箱格口数识别规格
    pub fn from_divisions(divisions: u32) -> Option<Self> {
        CompartmentSize::ALL
            .into_iter()
            .find(|size| size.compartments_per_bin() == divisions)
    }
}

impl fmt::Display for CompartmentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompartmentSize::Whole => write!(f, "1"),
            CompartmentSize::Half => write!(f, "1/2"),
            CompartmentSize::Quarter => write!(f, "1/4"),
            CompartmentSize::Eighth => write!(f, "1/8"),
        }
    }
}

// ==========================================
// 适配状态 (Fit Status)
// ==========================================
// 序列化格式与导出列 "Fit|No Fit" 一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitStatus {
    #[serde(rename = "Fit")]
    Fit,
    #[serde(rename = "No Fit")]
    NoFit,
    #[serde(rename = "No Dims")]
    NoDims,
    #[serde(rename = "SKU not found")]
    NotFound,
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStatus::Fit => write!(f, "Fit"),
            FitStatus::NoFit => write!(f, "No Fit"),
            FitStatus::NoDims => write!(f, "No Dims"),
            FitStatus::NotFound => write!(f, "SKU not found"),
        }
    }
}

// ==========================================
// 料箱型号 (Bin Type)
// ==========================================
// 型号编号即外箱高度等级, 映射到内部可用高度 (mm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BinType {
    H220,
    H330,
    H425,
}

impl BinType {
    /// 内部可用高度 (mm)
    pub fn inner_height_mm(self) -> f64 {
        match self {
            BinType::H220 => 202.0,
            BinType::H330 => 312.0,
            BinType::H425 => 404.0,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            BinType::H220 => 220,
            BinType::H330 => 330,
            BinType::H425 => 425,
        }
    }
}

impl TryFrom<u32> for BinType {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            220 => Ok(BinType::H220),
            330 => Ok(BinType::H330),
            425 => Ok(BinType::H425),
            other => Err(format!("不支持的料箱型号: {}（仅支持 220/330/425）", other)),
        }
    }
}

impl From<BinType> for u32 {
    fn from(value: BinType) -> Self {
        value.code()
    }
}

impl fmt::Display for BinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 单位制 (Unit System)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitSystem {
    #[serde(rename = "mm / kg")]
    Metric,
    #[serde(rename = "in / lb")]
    Imperial,
}

impl UnitSystem {
    pub const MM_PER_INCH: f64 = 25.4;
    pub const KG_PER_POUND: f64 = 0.453592;

    /// 长度换算为 mm
    pub fn length_to_mm(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => value * Self::MM_PER_INCH,
        }
    }

    /// 重量换算为 kg
    pub fn weight_to_kg(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => value * Self::KG_PER_POUND,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(' ', "").as_str() {
            "mm/kg" | "metric" => Some(UnitSystem::Metric),
            "in/lb" | "imperial" => Some(UnitSystem::Imperial),
            _ => None,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => write!(f, "mm / kg"),
            UnitSystem::Imperial => write!(f, "in / lb"),
        }
    }
}

// ==========================================
// 订单行结局 (Line Outcome)
// ==========================================
// unresolved → resolved(sufficient) | resolved(insufficient)
//            | excluded(no-fit) | excluded(not-found) | excluded(no-dims)
// 查找失败的行保持 Unresolved, 不进入最终输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineOutcome {
    Unresolved,
    Resolved,
    Insufficient,
    ExcludedNoFit,
    ExcludedNotFound,
    ExcludedNoDims,
}

impl LineOutcome {
    /// 由适配状态得到排除结局 (Fit 返回 None)
    pub fn excluded_for(status: FitStatus) -> Option<Self> {
        match status {
            FitStatus::Fit => None,
            FitStatus::NoFit => Some(LineOutcome::ExcludedNoFit),
            FitStatus::NoDims => Some(LineOutcome::ExcludedNoDims),
            FitStatus::NotFound => Some(LineOutcome::ExcludedNotFound),
        }
    }

    pub fn is_terminal(self) -> bool {
        self != LineOutcome::Unresolved
    }
}

impl fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineOutcome::Unresolved => write!(f, "UNRESOLVED"),
            LineOutcome::Resolved => write!(f, "RESOLVED"),
            LineOutcome::Insufficient => write!(f, "INSUFFICIENT"),
            LineOutcome::ExcludedNoFit => write!(f, "EXCLUDED_NO_FIT"),
            LineOutcome::ExcludedNotFound => write!(f, "EXCLUDED_NOT_FOUND"),
            LineOutcome::ExcludedNoDims => write!(f, "EXCLUDED_NO_DIMS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compartment_size_roundtrip() {
        for size in CompartmentSize::ALL {
            assert_eq!(CompartmentSize::from_fraction(size.fraction()), Some(size));
            assert_eq!(
                CompartmentSize::from_divisions(size.compartments_per_bin()),
                Some(size)
            );
        }
        assert_eq!(CompartmentSize::from_fraction(0.0), None);
        assert_eq!(CompartmentSize::from_fraction(0.3), None);
    }

    #[test]
    fn test_bin_type_height() {
        assert_eq!(BinType::try_from(220).unwrap().inner_height_mm(), 202.0);
        assert_eq!(BinType::try_from(330).unwrap().inner_height_mm(), 312.0);
        assert_eq!(BinType::try_from(425).unwrap().inner_height_mm(), 404.0);
        assert!(BinType::try_from(500).is_err());
    }

    #[test]
    fn test_imperial_conversion() {
        let units = UnitSystem::Imperial;
        assert!((units.length_to_mm(10.0) - 254.0).abs() < 1e-9);
        assert!((units.length_to_mm(5.0) - 127.0).abs() < 1e-9);
        assert!((units.length_to_mm(4.0) - 101.6).abs() < 1e-9);
        assert!((units.weight_to_kg(2.0) - 0.907184).abs() < 1e-9);
        assert_eq!(UnitSystem::Metric.length_to_mm(10.0), 10.0);
    }

    #[test]
    fn test_line_outcome_exclusion() {
        assert_eq!(LineOutcome::excluded_for(FitStatus::Fit), None);
        assert_eq!(
            LineOutcome::excluded_for(FitStatus::NoDims),
            Some(LineOutcome::ExcludedNoDims)
        );
        assert!(!LineOutcome::Unresolved.is_terminal());
    }
}
