//! 单实例锁：防止两个安装进程同时按同一清单安装。
//!
//! 锁文件内容为持有者 PID。获取时：
//! - 文件不存在：写入当前 PID
//! - 文件中的 PID 仍存活（且不是自己）：拒绝
//! - PID 不存在或内容损坏：视为残留锁，覆盖为当前 PID
//!
//! 锁在 [`InstanceLock`] 离开作用域时删除。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};
use tracing::{debug, warn};

/// 已持有的单实例锁。
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// 获取锁。
    ///
    /// 异常处理：
    /// - 另一存活进程持有锁：返回错误（包含其 PID）
    /// - 锁文件读写失败：返回错误
    pub fn acquire(path: &Path) -> Result<Self> {
        let own = std::process::id();
        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("读取锁文件失败: {}", path.display()))?;
            match raw.trim().parse::<u32>() {
                Ok(pid) if pid != own && is_pid_alive(pid) => {
                    return Err(anyhow!("另一个安装实例正在运行 (PID: {pid})"));
                }
                Ok(pid) if pid != own => warn!("检测到残留锁 (PID: {pid})，使用当前 PID 重新生成"),
                Ok(_) => {}
                Err(_) => warn!("锁文件内容无效，重新生成: {}", path.display()),
            }
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建锁文件目录失败: {}", parent.display()))?;
        }
        std::fs::write(path, own.to_string())
            .with_context(|| format!("写入锁文件失败: {}", path.display()))?;
        debug!("已获取单实例锁: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// 判断指定 PID 的进程是否存在。
pub fn is_pid_alive(pid: u32) -> bool {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new()),
    );
    system.process(Pid::from_u32(pid)).is_some()
}
