//! 组件文件落盘（递归复制源目录到目标目录）。
//!
//! 覆盖策略：目标文件一律覆盖，不比较版本或修改时间；只读目标文件先去掉只读属性再覆盖。
//! 因此重复执行是幂等的：失败后修复环境重新运行即可，无需手工清理。
//!
//! 失败时不回滚：已复制的部分保留在磁盘上，由调用方决定重试或中止。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::catalog::Component;
use crate::context::InstallContext;
use crate::error::{InstallError, Result};

/// 单个组件的落盘结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeResult {
    pub component_id: String,
    /// 目标目录（分组组件为空）。
    pub destination: Option<PathBuf>,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub directories_created: usize,
}

/// 将组件源目录复制到目标目录。
///
/// 参数：
/// - `component`：已选中的组件
/// - `_context`：安装上下文（当前复制逻辑与平台无关，保留以统一调用约定）
///
/// 返回值：
/// - 分组组件：返回空结果
/// - 其他：复制的文件数、字节数、新建目录数
///
/// 异常处理：
/// - 源路径不存在：`SourceMissing`
/// - 读源/建目录/写文件失败：`DestinationWriteError`（路径指向出错位置）
pub fn materialize(component: &Component, _context: &InstallContext) -> Result<MaterializeResult> {
    let mut result = MaterializeResult {
        component_id: component.id.clone(),
        destination: component.dest_path.clone(),
        ..Default::default()
    };
    let (Some(src), Some(dst)) = (component.source_path.as_deref(), component.dest_path.as_deref())
    else {
        return Ok(result);
    };
    if !src.exists() {
        return Err(InstallError::SourceMissing {
            component: component.id.clone(),
            path: src.to_path_buf(),
        });
    }

    let mut copier = Copier {
        component: &component.id,
        result: &mut result,
    };
    copier.copy_recursively(src, dst)?;
    debug!(
        "组件落盘完成: {} ({} 个文件, {} 字节)",
        component.id, result.files_copied, result.bytes_copied
    );
    Ok(result)
}

struct Copier<'a> {
    component: &'a str,
    result: &'a mut MaterializeResult,
}

impl Copier<'_> {
    fn write_error(&self, path: &Path, source: std::io::Error) -> InstallError {
        InstallError::DestinationWriteError {
            component: self.component.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        if dir.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(dir).map_err(|e| self.write_error(dir, e))?;
        self.result.directories_created += 1;
        Ok(())
    }

    /// 递归复制文件/目录。
    fn copy_recursively(&mut self, src: &Path, dst: &Path) -> Result<()> {
        if src.is_file() {
            if let Some(parent) = dst.parent() {
                self.ensure_dir(parent)?;
            }
            return self.copy_file(src, dst);
        }

        self.ensure_dir(dst)?;
        let entries = std::fs::read_dir(src).map_err(|e| self.write_error(src, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| self.write_error(src, e))?;
            let from = entry.path();
            let to = dst.join(entry.file_name());
            // 源中的符号链接按其指向的内容复制。
            let meta = std::fs::metadata(&from).map_err(|e| self.write_error(&from, e))?;
            if meta.is_dir() {
                self.remove_link(&to)?;
                self.copy_recursively(&from, &to)?;
            } else {
                self.copy_file(&from, &to)?;
            }
        }
        Ok(())
    }

    /// 删除目标位置上的符号链接（不跟随），避免写入链接指向的工具根目录之外的位置。
    fn remove_link(&self, path: &Path) -> Result<()> {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => std::fs::remove_file(path)
                .or_else(|_| std::fs::remove_dir(path))
                .map_err(|e| self.write_error(path, e)),
            _ => Ok(()),
        }
    }

    /// 覆盖复制单个文件。
    fn copy_file(&mut self, from: &Path, to: &Path) -> Result<()> {
        self.remove_link(to)?;
        if let Ok(meta) = std::fs::symlink_metadata(to) {
            if meta.is_dir() {
                std::fs::remove_dir_all(to).map_err(|e| self.write_error(to, e))?;
            } else if meta.permissions().readonly() {
                let mut perms = meta.permissions();
                #[allow(clippy::permissions_set_readonly_false)]
                perms.set_readonly(false);
                std::fs::set_permissions(to, perms).map_err(|e| self.write_error(to, e))?;
            }
        }
        let bytes = std::fs::copy(from, to).map_err(|e| self.write_error(to, e))?;
        self.result.files_copied += 1;
        self.result.bytes_copied += bytes;
        Ok(())
    }
}

/// 计算目录树摘要（SHA-256）。
///
/// 摘要覆盖：按相对路径排序后的每个文件路径与内容；目录结构变化、文件增删改都会改变摘要。
/// 符号链接不跟随，按链接目标路径计入摘要。
/// 路径为单个文件时只对该文件内容计算。
pub fn tree_digest(root: &Path) -> std::io::Result<String> {
    let mut entries = Vec::new();
    collect_entries(root, root, &mut entries)?;
    entries.sort();

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    for (rel, kind) in &entries {
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        hasher.update(rel_str.as_bytes());
        hasher.update([0u8]);
        let full = if rel.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel)
        };
        match kind {
            EntryKind::Link => {
                let target = std::fs::read_link(&full)?;
                hasher.update(b"link:");
                hasher.update(target.to_string_lossy().as_bytes());
            }
            EntryKind::File => {
                let mut f = std::fs::File::open(&full)?;
                loop {
                    let n = f.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
            }
        }
        hasher.update([0u8]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EntryKind {
    File,
    Link,
}

fn collect_entries(
    root: &Path,
    cur: &Path,
    out: &mut Vec<(PathBuf, EntryKind)>,
) -> std::io::Result<()> {
    if cur.is_file() {
        out.push((cur.strip_prefix(root).unwrap_or(cur).to_path_buf(), EntryKind::File));
        return Ok(());
    }
    for entry in std::fs::read_dir(cur)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if file_type.is_symlink() {
            out.push((rel, EntryKind::Link));
        } else if file_type.is_dir() {
            collect_entries(root, &path, out)?;
        } else {
            out.push((rel, EntryKind::File));
        }
    }
    Ok(())
}
