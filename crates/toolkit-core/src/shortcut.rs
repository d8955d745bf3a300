//! 快捷方式登记：把模板展开为启动项条目并交给平台写入器落盘。
//!
//! 显示路径格式：
//! - `{group}\<子目录...>\<名称>`：开始菜单程序组
//! - `{sendto}\<名称>`：“发送到”菜单
//!
//! 同一组件的 32/64 位模板依靠互补条件保证同一次运行只生成其中一个；
//! 目录加载时已校验同一显示路径的模板两两互斥（见 [`crate::catalog`]）。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::Component;
use crate::condition::{self, PlatformCondition};
use crate::context::InstallContext;
use crate::error::{InstallError, Result};
use crate::manifest::ShortcutTemplate;
use crate::paths;

const GROUP_PREFIX: &str = "{group}";
const SEND_TO_PREFIX: &str = "{sendto}";

/// 快捷方式放置位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutLocation {
    /// 开始菜单程序组。
    ProgramGroup,
    /// “发送到”菜单。
    SendTo,
}

impl ShortcutLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProgramGroup => "program_group",
            Self::SendTo => "send_to",
        }
    }
}

/// 解析后的显示路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPath {
    pub location: ShortcutLocation,
    /// 位置根目录下的子目录。
    pub folders: Vec<String>,
    /// 快捷方式名称（不含扩展名）。
    pub name: String,
}

impl DisplayPath {
    /// 解析 `{group}\...` / `{sendto}\...` 形式的显示路径。
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        let (location, rest) = if lower.starts_with(GROUP_PREFIX) {
            (ShortcutLocation::ProgramGroup, &trimmed[GROUP_PREFIX.len()..])
        } else if lower.starts_with(SEND_TO_PREFIX) {
            (ShortcutLocation::SendTo, &trimmed[SEND_TO_PREFIX.len()..])
        } else {
            return Err(format!("显示路径缺少 {{group}} 或 {{sendto}} 前缀: {raw}"));
        };
        if !rest.is_empty() && !rest.starts_with(['\\', '/']) {
            return Err(format!("显示路径前缀后必须是路径分隔符: {raw}"));
        }
        let mut parts: Vec<String> = rest
            .split(['\\', '/'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if parts.iter().any(|p| p == "." || p == "..") {
            return Err(format!("显示路径不允许包含 . 或 ..: {raw}"));
        }
        let Some(name) = parts.pop() else {
            return Err(format!("显示路径缺少快捷方式名称: {raw}"));
        };
        Ok(Self {
            location,
            folders: parts,
            name,
        })
    }
}

/// 快捷方式根目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRoots {
    /// 程序组目录（`{group}` 展开结果，已包含程序组名称）。
    pub program_group: PathBuf,
    /// “发送到”目录。
    pub send_to: PathBuf,
}

impl LinkRoots {
    fn root_for(&self, location: ShortcutLocation) -> &Path {
        match location {
            ShortcutLocation::ProgramGroup => &self.program_group,
            ShortcutLocation::SendTo => &self.send_to,
        }
    }
}

/// 一个待创建的启动项条目（创建后不再修改）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    /// 模板中的显示路径原文。
    pub display_path: String,
    pub location: ShortcutLocation,
    /// 启动项所在目录。
    pub link_dir: PathBuf,
    /// 启动项名称（不含扩展名）。
    pub name: String,
    /// 目标可执行文件完整路径。
    pub target_executable: PathBuf,
    /// 工作目录完整路径。
    pub working_dir: PathBuf,
    /// 所属组件 ID。
    pub owning_component: String,
    pub condition: Option<PlatformCondition>,
}

/// 启动项写入器（由平台层实现：Windows 写 `.lnk`，其他平台写 `.desktop`）。
pub trait LinkWriter {
    /// 写入启动项，返回实际落盘的文件路径。
    fn write_link(&self, entry: &ShortcutEntry) -> anyhow::Result<PathBuf>;
}

/// 已落盘的启动项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredShortcut {
    pub entry: ShortcutEntry,
    pub link_path: PathBuf,
}

/// 按条件展开组件的快捷方式模板（纯函数，不做 IO）。
///
/// 参数：
/// - `component`：已选中的组件（需带 `dest_path`）
/// - `templates`：该组件绑定的模板（按声明顺序）
/// - `context`：安装上下文（条件求值）
/// - `roots`：快捷方式根目录
///
/// 返回值：
/// - 条件为真或无条件的模板各生成一个 [`ShortcutEntry`]
///
/// 异常处理：
/// - 组件无目标目录或显示路径非法：`ManifestInvalid`
pub fn plan<'a, I>(
    component: &Component,
    templates: I,
    context: &InstallContext,
    roots: &LinkRoots,
) -> Result<Vec<ShortcutEntry>>
where
    I: IntoIterator<Item = &'a ShortcutTemplate>,
{
    let mut entries = Vec::new();
    for t in templates {
        if t.component_id != component.id {
            continue;
        }
        if !condition::evaluate_opt(t.condition.as_ref(), context) {
            debug!("条件不满足，跳过快捷方式: {} ({})", t.display_path, component.id);
            continue;
        }
        let invalid = |message: String| InstallError::ManifestInvalid {
            component: Some(component.id.clone()),
            message,
        };
        let dest = component
            .dest_path
            .as_deref()
            .ok_or_else(|| invalid(format!("分组组件不能绑定快捷方式: {}", t.display_path)))?;
        let display = DisplayPath::parse(&t.display_path).map_err(invalid)?;

        let target_executable = paths::resolve_path(dest, &t.target_executable)
            .map_err(|e| invalid(format!("target_executable: {e}")))?;
        let working_dir = match t.working_dir.as_deref() {
            Some(raw) if !raw.trim().is_empty() => paths::resolve_path(dest, raw)
                .map_err(|e| invalid(format!("working_dir: {e}")))?,
            _ => target_executable
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dest.to_path_buf()),
        };

        let mut link_dir = roots.root_for(display.location).to_path_buf();
        for folder in &display.folders {
            link_dir.push(folder);
        }

        entries.push(ShortcutEntry {
            display_path: t.display_path.clone(),
            location: display.location,
            link_dir,
            name: display.name,
            target_executable,
            working_dir,
            owning_component: component.id.clone(),
            condition: t.condition.clone(),
        });
    }
    Ok(entries)
}

/// 为组件创建启动项。
///
/// 两类位置（程序组 / 发送到）相互独立：同一组件同时有两类模板时都会生成。
///
/// 异常处理：
/// - 展开失败：见 [`plan`]
/// - 写入失败：`ShortcutWriteError`（已写入的启动项保留）
pub fn register<'a, I, W>(
    component: &Component,
    templates: I,
    context: &InstallContext,
    roots: &LinkRoots,
    writer: &W,
) -> Result<Vec<RegisteredShortcut>>
where
    I: IntoIterator<Item = &'a ShortcutTemplate>,
    W: LinkWriter + ?Sized,
{
    let entries = plan(component, templates, context, roots)?;
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.target_executable.exists() {
            warn!(
                "快捷方式目标不存在: {} -> {}",
                entry.display_path,
                entry.target_executable.display()
            );
        }
        let link_path = writer
            .write_link(&entry)
            .map_err(|source| InstallError::ShortcutWriteError {
                component: component.id.clone(),
                path: entry.link_dir.join(&entry.name),
                source,
            })?;
        debug!("已创建快捷方式: {}", link_path.display());
        out.push(RegisteredShortcut { entry, link_path });
    }
    Ok(out)
}
