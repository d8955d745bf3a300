//! 逆向工具集安装核心库（平台无关）。
//!
//! 功能：
//! - 定义安装清单（toolkit-manifest.json）、组件目录与快捷方式模板
//! - 平台条件（32/64 位）求值与安装上下文
//! - 组件文件落盘、快捷方式登记与安装驱动状态机
//! - 安装状态落盘模型（install-state.json）与路径约定
//!
//! 启动项的实际写入由平台层实现 [`shortcut::LinkWriter`]。
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod catalog;
pub mod condition;
pub mod context;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod materialize;
pub mod paths;
pub mod shortcut;
pub mod state;
