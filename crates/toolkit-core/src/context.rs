//! 安装上下文（一次安装运行内只读）。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 安装平台（由宿主环境在启动时给出，运行期间不再重新检测）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// 32 位安装模式。
    X86,
    /// 64 位安装模式。
    X64,
}

impl Platform {
    pub fn is_64bit(self) -> bool {
        matches!(self, Self::X64)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" | "32" => Ok(Self::X86),
            "x64" | "x86_64" | "amd64" | "64" => Ok(Self::X64),
            other => Err(format!("未知平台: {other}")),
        }
    }
}

/// 安装类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallType {
    /// 完整安装。
    Full,
    /// 精简安装。
    Compact,
    /// 自定义安装（由用户显式勾选组件）。
    Custom,
}

impl InstallType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Compact => "compact",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for InstallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "custom" => Ok(Self::Custom),
            other => Err(format!("未知安装类型: {other}")),
        }
    }
}

impl std::fmt::Display for InstallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次安装运行的上下文。
///
/// 说明：
/// - 由用户输入初始化一次，之后只读（字段私有，仅提供读取方法）
/// - `selected` 是用户显式勾选的组件 ID（自定义安装时使用）；最终安装集合由目录解析得出
#[derive(Debug, Clone)]
pub struct InstallContext {
    platform: Platform,
    install_type: InstallType,
    selected: BTreeSet<String>,
}

impl InstallContext {
    pub fn new(platform: Platform, install_type: InstallType) -> Self {
        Self {
            platform,
            install_type,
            selected: BTreeSet::new(),
        }
    }

    /// 附带显式勾选的组件 ID。
    pub fn with_selected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_64bit(&self) -> bool {
        self.platform.is_64bit()
    }

    pub fn install_type(&self) -> InstallType {
        self.install_type
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }
}
