//! 安装错误分类。
//!
//! 分类：
//! - `UnknownComponent`：清单/选择不一致（在任何文件 IO 之前终止）
//! - `SourceMissing`：打包缺陷，源目录不存在
//! - `DestinationWriteError`：目标目录写入失败（已落盘的组件保留，不回滚）
//! - `ShortcutWriteError`：启动项文件写入失败
//! - 其余为清单加载阶段的校验错误
//!
//! 约定：每个致命错误都必须能给出出错的组件 ID（若有），供调用方上报。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::PathBuf;

use thiserror::Error;

/// 安装过程中的错误。
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("未知组件: {id}")]
    UnknownComponent {
        /// 找不到的组件 ID。
        id: String,
        /// 引用该 ID 的组件或快捷方式所属组件（若有）。
        referenced_by: Option<String>,
    },

    #[error("组件源目录不存在: {component} ({})", path.display())]
    SourceMissing { component: String, path: PathBuf },

    #[error("写入目标失败: {component} ({}): {source}", path.display())]
    DestinationWriteError {
        component: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("创建快捷方式失败: {component} ({}): {source}", path.display())]
    ShortcutWriteError {
        component: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("组件 ID 重复: {id}")]
    DuplicateComponent { id: String },

    #[error("快捷方式条件冲突: {component} -> {display_path}")]
    ConflictingShortcuts {
        component: String,
        display_path: String,
    },

    #[error("清单无效: {message}")]
    ManifestInvalid {
        component: Option<String>,
        message: String,
    },
}

/// 错误种类（稳定名称，用于日志与退出码）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownComponent,
    SourceMissing,
    DestinationWriteError,
    ShortcutWriteError,
    DuplicateComponent,
    ConflictingShortcuts,
    ManifestInvalid,
}

impl ErrorKind {
    /// snake_case 名称。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownComponent => "unknown_component",
            Self::SourceMissing => "source_missing",
            Self::DestinationWriteError => "destination_write_error",
            Self::ShortcutWriteError => "shortcut_write_error",
            Self::DuplicateComponent => "duplicate_component",
            Self::ConflictingShortcuts => "conflicting_shortcuts",
            Self::ManifestInvalid => "manifest_invalid",
        }
    }

    /// 进程退出码（0 保留给成功）。
    pub fn exit_code(self) -> u8 {
        match self {
            Self::UnknownComponent => 2,
            Self::SourceMissing => 3,
            Self::DestinationWriteError => 4,
            Self::ShortcutWriteError => 5,
            Self::DuplicateComponent | Self::ConflictingShortcuts | Self::ManifestInvalid => 1,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InstallError {
    /// 错误种类。
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownComponent { .. } => ErrorKind::UnknownComponent,
            Self::SourceMissing { .. } => ErrorKind::SourceMissing,
            Self::DestinationWriteError { .. } => ErrorKind::DestinationWriteError,
            Self::ShortcutWriteError { .. } => ErrorKind::ShortcutWriteError,
            Self::DuplicateComponent { .. } => ErrorKind::DuplicateComponent,
            Self::ConflictingShortcuts { .. } => ErrorKind::ConflictingShortcuts,
            Self::ManifestInvalid { .. } => ErrorKind::ManifestInvalid,
        }
    }

    /// 出错的组件 ID。
    ///
    /// 对 `UnknownComponent` 返回缺失的 ID 本身。
    pub fn component_id(&self) -> Option<&str> {
        match self {
            Self::UnknownComponent { id, .. } => Some(id),
            Self::SourceMissing { component, .. }
            | Self::DestinationWriteError { component, .. }
            | Self::ShortcutWriteError { component, .. }
            | Self::ConflictingShortcuts { component, .. } => Some(component),
            Self::DuplicateComponent { id } => Some(id),
            Self::ManifestInvalid { component, .. } => component.as_deref(),
        }
    }
}

pub type Result<T, E = InstallError> = std::result::Result<T, E>;
