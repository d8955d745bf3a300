//! 路径约定与解析。
//!
//! 目标：
//! - 清单中的相对路径统一按“清单文件目录”解析
//! - 状态文件放在工具安装根目录下；锁文件放在清单目录下（解析失败时不触碰工具根目录）
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// 安装状态文件名（位于工具安装根目录）。
pub const STATE_FILE_NAME: &str = "install-state.json";

/// 单实例锁文件名（位于清单文件目录）。
pub const LOCK_FILE_NAME: &str = "toolkit.lock";

/// 确保目录存在（不存在则递归创建）。
///
/// 异常处理：
/// - 目录创建失败（权限、路径非法等）会返回错误。
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("创建目录失败: {}", path.display()))?;
    Ok(())
}

/// 将清单中的路径字段解析为实际路径。
///
/// 返回值：
/// - `raw` 为绝对路径：直接返回
/// - `raw` 为相对路径：返回 `base.join(raw)`
///
/// 异常处理：
/// - `raw` 为空字符串时返回错误，避免误用导致写入基准目录本身。
pub fn resolve_path(base: &Path, raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(anyhow!("空路径"));
    }
    let p = PathBuf::from(normalize_separators(raw));
    if p.is_absolute() {
        Ok(p)
    } else {
        Ok(base.join(p))
    }
}

/// 将清单里的 `\` 分隔符统一为当前平台分隔符（清单通常在 Windows 下编写）。
pub fn normalize_separators(raw: &str) -> String {
    if std::path::MAIN_SEPARATOR == '\\' {
        raw.replace('/', "\\")
    } else {
        raw.replace('\\', "/")
    }
}

/// 安装状态文件路径：`<tools_root>/install-state.json`。
pub fn state_file(tools_root: &Path) -> PathBuf {
    tools_root.join(STATE_FILE_NAME)
}

/// 锁文件路径：`<清单目录>/toolkit.lock`。
pub fn lock_file(manifest_dir: &Path) -> PathBuf {
    manifest_dir.join(LOCK_FILE_NAME)
}
