//! 宿主架构检测（决定 32/64 位安装模式）。
//!
//! 检测只在运行开始时做一次，结果写入安装上下文后不再变化。
//! 环境变量 `TOOLKIT_FORCE_ARCH`（`x86`/`x64`）可覆盖检测结果，用于测试与打包验证。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use anyhow::{anyhow, Result};
use sysinfo::System;
use toolkit_core::context::Platform;

/// 覆盖架构检测的环境变量名。
pub const FORCE_ARCH_ENV: &str = "TOOLKIT_FORCE_ARCH";

/// 检测宿主平台。
///
/// 异常处理：
/// - `TOOLKIT_FORCE_ARCH` 取值无法识别时返回错误（不静默回退）。
pub fn detect_host_platform() -> Result<Platform> {
    if let Ok(raw) = std::env::var(FORCE_ARCH_ENV) {
        if !raw.trim().is_empty() {
            return raw
                .parse::<Platform>()
                .map_err(|e| anyhow!("{FORCE_ARCH_ENV}: {e}"));
        }
    }
    Ok(platform_from_arch(System::cpu_arch().as_deref()))
}

/// 原始 CPU 架构名（用于自检输出）。
pub fn host_cpu_arch() -> Option<String> {
    System::cpu_arch()
}

/// 将 CPU 架构名映射为安装平台；未知时按当前进程位宽判断。
pub fn platform_from_arch(arch: Option<&str>) -> Platform {
    match arch.map(|a| a.trim().to_ascii_lowercase()).as_deref() {
        Some("x86_64" | "amd64" | "x64" | "aarch64" | "arm64") => Platform::X64,
        Some("x86" | "i386" | "i586" | "i686" | "arm" | "armv7") => Platform::X86,
        _ if cfg!(target_pointer_width = "64") => Platform::X64,
        _ => Platform::X86,
    }
}
