//! 工具集安装清单（toolkit-manifest.json）模型定义。
//!
//! 该模块描述安装程序需要的全部静态输入：
//! - 产品信息与源/目标根目录
//! - 可选组件目录（ID、显示名、所属安装类型、源目录、目标目录）
//! - 快捷方式模板（开始菜单程序组 / 发送到）
//!
//! 约定：
//! - 组件与模板按声明顺序保存，安装顺序即声明顺序
//! - 该模块仅定义数据结构，不执行任何 IO；校验由 [`crate::catalog::Catalog`] 完成
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use serde::{Deserialize, Deserializer, Serialize};

use crate::condition::PlatformCondition;
use crate::context::InstallType;

/// 清单根对象（对应 `toolkit-manifest.json`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitManifest {
    /// 产品显示名称。
    pub product_name: String,
    /// 版本号（用于展示/状态落盘）。
    pub version: String,
    /// 组件源目录根（相对清单文件目录或绝对路径）。
    pub source_root: String,
    /// 工具安装根目录（相对清单文件目录或绝对路径）。
    pub tools_root: String,
    #[serde(default = "default_shortcut_group")]
    /// 开始菜单程序组名称（`{group}` 前缀展开到该目录）。
    pub shortcut_group: String,
    #[serde(default)]
    /// 未指定 `--type` 时使用的安装类型。
    pub default_install_type: Option<InstallType>,
    #[serde(default)]
    /// 快捷方式根目录覆盖（为空则使用系统默认位置）。
    pub shortcut_roots: ShortcutRootsManifest,
    /// 组件目录。
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    /// 快捷方式模板。
    pub shortcuts: Vec<ShortcutTemplate>,
}

fn default_shortcut_group() -> String {
    "Toolkit".to_string()
}

/// 快捷方式根目录覆盖。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShortcutRootsManifest {
    #[serde(default)]
    /// 开始菜单 Programs 目录（程序组目录在其下创建）。
    pub programs: Option<String>,
    #[serde(default)]
    /// “发送到”目录。
    pub send_to: Option<String>,
}

/// 单个组件记录。
///
/// 说明：
/// - `id` 为层级 ID（如 `hexeditor/hxd`），子组件仅在父组件也被选中时有效
/// - `source_path`/`dest_path` 同时为空表示纯分组节点（不复制任何文件）
/// - `group` 可写单个安装类型或列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// 组件 ID（全局唯一）。
    pub id: String,
    /// 显示名称。
    pub display_name: String,
    #[serde(deserialize_with = "one_or_many")]
    /// 所属安装类型集合。
    pub group: Vec<InstallType>,
    #[serde(default)]
    /// 源目录（相对 `source_root`）。
    pub source_path: Option<String>,
    #[serde(default)]
    /// 目标目录（相对 `tools_root`）。
    pub dest_path: Option<String>,
}

/// 快捷方式模板。
///
/// `display_path` 以 `{group}` 或 `{sendto}` 开头，分隔符可用 `\` 或 `/`，
/// 例如 `{group}\HEX Editor\HxD`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutTemplate {
    /// 所属组件 ID。
    pub component_id: String,
    /// 显示路径（含位置前缀）。
    pub display_path: String,
    /// 目标可执行文件（相对组件 `dest_path`）。
    pub target_executable: String,
    #[serde(default)]
    /// 工作目录（相对组件 `dest_path`；为空则使用目标文件所在目录）。
    pub working_dir: Option<String>,
    #[serde(default)]
    /// 平台条件（为空表示总是创建）。
    pub condition: Option<PlatformCondition>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<InstallType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(InstallType),
        Many(Vec<InstallType>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(t) => vec![t],
        OneOrMany::Many(v) => v,
    })
}
