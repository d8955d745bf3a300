//! 安装状态落盘模型（install-state.json）。
//!
//! 目的：
//! - 记录本次安装落盘了哪些组件、目录摘要与创建的启动项，便于 `verify` 校验与排障
//! - 只在安装运行到达 `Done` 后写入；失败的运行不会留下状态文件
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::context::{InstallType, Platform};

/// 安装状态。
///
/// 字段说明：
/// - `state_id`：本次安装状态文件 ID（用于区分多次安装）
/// - `platform`/`install_type`：本次运行的上下文
/// - `components`：已落盘组件（按安装顺序）
/// - `created_shortcuts`：创建的启动项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallState {
    pub state_id: Uuid,
    pub product_name: String,
    pub version: String,
    pub installed_at: OffsetDateTime,
    pub platform: Platform,
    pub install_type: InstallType,
    #[serde(default)]
    pub components: Vec<InstalledComponent>,
    #[serde(default)]
    pub created_shortcuts: Vec<CreatedShortcut>,
}

impl InstallState {
    /// 创建一份新的安装状态（随机 `state_id`，当前 UTC 时间）。
    pub fn new(
        product_name: String,
        version: String,
        platform: Platform,
        install_type: InstallType,
    ) -> Self {
        Self {
            state_id: Uuid::new_v4(),
            product_name,
            version,
            installed_at: OffsetDateTime::now_utc(),
            platform,
            install_type,
            components: Vec::new(),
            created_shortcuts: Vec::new(),
        }
    }
}

/// 已落盘组件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledComponent {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    /// 目标目录（分组组件为空）。
    pub destination: Option<String>,
    #[serde(default)]
    pub files_copied: usize,
    #[serde(default)]
    /// 目标目录树摘要（SHA-256，十六进制）。
    pub digest: Option<String>,
}

/// 安装过程中创建的启动项记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedShortcut {
    pub component_id: String,
    /// 位置（`program_group` / `send_to`）。
    pub location: String,
    /// 启动项文件完整路径。
    pub path: String,
    /// 目标可执行文件完整路径。
    pub target: String,
}
