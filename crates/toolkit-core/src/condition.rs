//! 平台条件表达式与求值。
//!
//! 清单中的条件沿用安装脚本写法：
//! - `Is64BitInstallMode`
//! - `not Is64BitInstallMode`（`not` 可重复，大小写不敏感）
//!
//! 求值是纯函数：不读环境、不产生副作用，对任意合法上下文都返回结果。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{InstallContext, Platform};

const IS_64BIT_INSTALL_MODE: &str = "Is64BitInstallMode";

/// 平台条件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformCondition {
    /// 当前为 64 位安装模式。
    Is64BitInstall,
    /// 取反。
    Not(Box<PlatformCondition>),
}

impl PlatformCondition {
    /// 构造 `not <self>`。
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// 在给定平台上求值。
    pub fn holds_on(&self, platform: Platform) -> bool {
        match self {
            Self::Is64BitInstall => platform.is_64bit(),
            Self::Not(inner) => !inner.holds_on(platform),
        }
    }
}

/// 对条件求值（纯函数）。
pub fn evaluate(condition: &PlatformCondition, context: &InstallContext) -> bool {
    condition.holds_on(context.platform())
}

/// 对可选条件求值：未设置条件视为成立。
pub fn evaluate_opt(condition: Option<&PlatformCondition>, context: &InstallContext) -> bool {
    condition.map_or(true, |c| evaluate(c, context))
}

/// 判断两个（可选）条件是否互斥：不存在任何平台使二者同时成立。
pub fn mutually_exclusive(a: Option<&PlatformCondition>, b: Option<&PlatformCondition>) -> bool {
    [Platform::X86, Platform::X64].into_iter().all(|p| {
        let ha = a.map_or(true, |c| c.holds_on(p));
        let hb = b.map_or(true, |c| c.holds_on(p));
        !(ha && hb)
    })
}

/// 条件解析错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionParseError {
    #[error("条件为空")]
    Empty,
    #[error("不支持的条件: {0}")]
    Unsupported(String),
}

impl std::str::FromStr for PlatformCondition {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(ConditionParseError::Empty);
        }
        let mut negations = 0usize;
        loop {
            let lower = rest.to_ascii_lowercase();
            if lower.starts_with("not ") {
                negations += 1;
                rest = rest[4..].trim_start();
            } else {
                break;
            }
        }
        if !rest.eq_ignore_ascii_case(IS_64BIT_INSTALL_MODE) {
            return Err(ConditionParseError::Unsupported(s.trim().to_string()));
        }
        let mut cond = Self::Is64BitInstall;
        for _ in 0..negations {
            cond = cond.negate();
        }
        Ok(cond)
    }
}

impl TryFrom<String> for PlatformCondition {
    type Error = ConditionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlatformCondition> for String {
    fn from(value: PlatformCondition) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for PlatformCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Is64BitInstall => f.write_str(IS_64BIT_INSTALL_MODE),
            Self::Not(inner) => write!(f, "not {inner}"),
        }
    }
}
