//! 平台能力封装（宿主架构检测、启动项写入、单实例锁）。
//!
//! 目标：
//! - 将操作系统相关的检测与副作用集中在本 crate，核心库保持平台无关
//! - 统一错误处理风格（以 `anyhow::Result` 形式向上返回）
//!
//! 平台差异：
//! - Windows：启动项为 `.lnk`（COM `IShellLinkW`），根目录取 Known Folder（Programs / SendTo）
//! - 其他平台：启动项为 freedesktop `.desktop` 文件，根目录取 XDG 数据目录
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod arch;
pub mod instance;
pub mod link;
