//! 安装驱动：目录解析 → 文件落盘 → 快捷方式登记。
//!
//! 阶段流转：
//!
//! ```text
//! NotStarted -> SelectionResolved -> Materializing -> RegisteringShortcuts -> Done
//!      \                                  \                   \
//!       +----------------------------------+-------------------+--> Failed
//! ```
//!
//! 约定：
//! - 单线程顺序执行；不同组件可能共享目标根目录，顺序执行避免目录创建竞争
//! - 任一组件失败即整体失败，不存在“部分成功”的终态；已落盘内容保留
//! - 所有组件落盘完成后才开始登记快捷方式
//! - 失败的运行不可续跑，调用方应以新的 [`Installer`] 从 `NotStarted` 重新开始
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fmt;

use thiserror::Error;
use tracing::{error, info};

use crate::catalog::{Catalog, Component};
use crate::context::InstallContext;
use crate::error::InstallError;
use crate::materialize::{self, MaterializeResult};
use crate::shortcut::{self, LinkRoots, LinkWriter, RegisteredShortcut};

/// 安装阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallPhase {
    NotStarted,
    SelectionResolved,
    Materializing,
    RegisteringShortcuts,
    Done,
    Failed,
}

impl InstallPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// 成功路径上的下一阶段。
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::SelectionResolved),
            Self::SelectionResolved => Some(Self::Materializing),
            Self::Materializing => Some(Self::RegisteringShortcuts),
            Self::RegisteringShortcuts => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// 是否允许从当前阶段流转到 `to`。
    ///
    /// 目录解析失败同样进入 `Failed`（此时尚无文件 IO）。
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Failed {
            return matches!(
                self,
                Self::NotStarted | Self::Materializing | Self::RegisteringShortcuts
            );
        }
        self.next() == Some(to)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::SelectionResolved => "selection_resolved",
            Self::Materializing => "materializing",
            Self::RegisteringShortcuts => "registering_shortcuts",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 成功运行的结果。
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// 解析出的组件（安装顺序）。
    pub selection: Vec<Component>,
    pub materialized: Vec<MaterializeResult>,
    pub shortcuts: Vec<RegisteredShortcut>,
    /// 经历过的阶段（含 `NotStarted` 与终态）。
    pub history: Vec<InstallPhase>,
}

impl InstallReport {
    pub fn files_copied(&self) -> usize {
        self.materialized.iter().map(|m| m.files_copied).sum()
    }

    pub fn bytes_copied(&self) -> u64 {
        self.materialized.iter().map(|m| m.bytes_copied).sum()
    }
}

/// 失败运行的结果。
#[derive(Debug, Error)]
#[error("安装失败（阶段 {failed_during}）: {error}")]
pub struct InstallFailure {
    /// 出错时所处阶段。
    pub failed_during: InstallPhase,
    #[source]
    pub error: InstallError,
    /// 失败前已落盘的组件（保留在磁盘上）。
    pub materialized: Vec<MaterializeResult>,
    /// 失败前已创建的启动项。
    pub shortcuts: Vec<RegisteredShortcut>,
    pub history: Vec<InstallPhase>,
}

/// 安装驱动（一次性使用）。
pub struct Installer<'a, W: LinkWriter + ?Sized> {
    catalog: &'a Catalog,
    context: InstallContext,
    roots: LinkRoots,
    writer: &'a W,
    phase: InstallPhase,
    history: Vec<InstallPhase>,
}

impl<'a, W: LinkWriter + ?Sized> Installer<'a, W> {
    pub fn new(catalog: &'a Catalog, context: InstallContext, roots: LinkRoots, writer: &'a W) -> Self {
        Self {
            catalog,
            context,
            roots,
            writer,
            phase: InstallPhase::NotStarted,
            history: vec![InstallPhase::NotStarted],
        }
    }

    pub fn phase(&self) -> InstallPhase {
        self.phase
    }

    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    fn enter(&mut self, to: InstallPhase) {
        debug_assert!(
            self.phase.can_transition_to(to),
            "非法阶段流转: {} -> {}",
            self.phase,
            to
        );
        info!("阶段: {} -> {}", self.phase, to);
        self.phase = to;
        self.history.push(to);
    }

    fn fail(
        mut self,
        error: InstallError,
        materialized: Vec<MaterializeResult>,
        shortcuts: Vec<RegisteredShortcut>,
    ) -> InstallFailure {
        let failed_during = self.phase;
        error!(
            "安装失败: kind={} component={} phase={}: {}",
            error.kind(),
            error.component_id().unwrap_or("-"),
            failed_during,
            error
        );
        self.enter(InstallPhase::Failed);
        InstallFailure {
            failed_during,
            error,
            materialized,
            shortcuts,
            history: self.history,
        }
    }

    /// 执行完整安装流程。
    ///
    /// 返回值：
    /// - `Ok(InstallReport)`：到达 `Done`
    /// - `Err(InstallFailure)`：到达 `Failed`，携带出错阶段、错误与已完成部分
    pub fn run(mut self) -> Result<InstallReport, InstallFailure> {
        let selection = match self.catalog.resolve_for(&self.context) {
            Ok(s) => s,
            Err(e) => return Err(self.fail(e, Vec::new(), Vec::new())),
        };
        info!(
            "已解析 {} 个组件（类型 {}，平台 {}）",
            selection.len(),
            self.context.install_type(),
            self.context.platform().as_str()
        );
        self.enter(InstallPhase::SelectionResolved);

        self.enter(InstallPhase::Materializing);
        let mut materialized = Vec::with_capacity(selection.len());
        for component in &selection {
            info!("落盘组件: {} ({})", component.display_name, component.id);
            match materialize::materialize(component, &self.context) {
                Ok(r) => materialized.push(r),
                Err(e) => return Err(self.fail(e, materialized, Vec::new())),
            }
        }

        self.enter(InstallPhase::RegisteringShortcuts);
        let mut shortcuts = Vec::new();
        for component in &selection {
            let templates = self.catalog.templates_for(&component.id);
            match shortcut::register(component, templates, &self.context, &self.roots, self.writer) {
                Ok(created) => shortcuts.extend(created),
                Err(e) => return Err(self.fail(e, materialized, shortcuts)),
            }
        }

        self.enter(InstallPhase::Done);
        Ok(InstallReport {
            selection,
            materialized,
            shortcuts,
            history: self.history,
        })
    }
}
