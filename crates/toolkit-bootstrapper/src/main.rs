//! 工具集安装引导程序（bootstrapper）。
//!
//! 职责：
//! - 读取 `toolkit-manifest.json`，按安装类型/显式勾选解析组件集合
//! - 检测宿主架构（32/64 位），决定平台条件快捷方式的取舍
//! - 驱动安装：组件文件落盘 → 程序组/“发送到”启动项登记
//! - 到达 `Done` 后生成 `install-state.json`，供 `verify` 校验
//!
//! 退出码：
//! - 0：成功
//! - 2：未知组件；3：源目录缺失；4：目标写入失败；5：启动项写入失败
//! - 1：其他错误（清单解析、锁冲突、校验不一致等）
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use toolkit_core::catalog::Catalog;
use toolkit_core::context::{InstallContext, InstallType};
use toolkit_core::error::InstallError;
use toolkit_core::installer::{InstallFailure, InstallReport, Installer};
use toolkit_core::manifest::ToolkitManifest;
use toolkit_core::materialize;
use toolkit_core::paths;
use toolkit_core::shortcut::{self, LinkRoots};
use toolkit_core::state::{CreatedShortcut, InstallState, InstalledComponent};
use toolkit_platform::arch;
use toolkit_platform::instance::InstanceLock;
use toolkit_platform::link::{self, SystemLinkWriter};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

/// 命令行参数。
///
/// 说明：
/// - `manifest` 指向安装清单文件（默认 `toolkit-manifest.json`）
/// - `silent` 只输出警告与错误；`debug` 输出调试日志
/// - `disable_mutex_check` 跳过单实例锁（允许并发运行）
#[derive(Debug, Parser)]
#[command(name = "toolkit-bootstrapper", version)]
struct Cli {
    #[arg(long, default_value = "toolkit-manifest.json")]
    manifest: PathBuf,

    #[arg(long, default_value_t = false)]
    silent: bool,

    #[arg(long, default_value_t = false)]
    debug: bool,

    #[arg(long, default_value_t = false)]
    disable_mutex_check: bool,

    #[command(subcommand)]
    command: Commands,
}

/// bootstrapper 支持的子命令。
#[derive(Debug, Subcommand)]
enum Commands {
    /// 安装选中的组件并创建启动项。
    Install(SelectionArgs),
    /// 列出目录中的全部组件及其落盘状态。
    List,
    /// 仅解析并输出将要安装的组件与启动项（不做任何修改）。
    Plan(SelectionArgs),
    /// 按安装记录校验已落盘组件是否被改动。
    Verify,
    /// 环境自检（架构检测、启动项目录）。
    Doctor,
}

/// 组件选择参数。
#[derive(Debug, Clone, Args)]
struct SelectionArgs {
    /// 安装类型（full/compact/custom）；缺省取清单 `default_install_type`，再缺省为 full。
    #[arg(long = "type")]
    install_type: Option<InstallType>,

    /// 额外勾选的组件 ID（可重复）。
    #[arg(long = "component")]
    components: Vec<String>,
}

/// 程序入口：初始化日志、分发子命令并映射退出码。
fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::DEBUG
    } else if cli.silent {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Install(sel) => install(&cli, sel),
        Commands::List => list(&cli),
        Commands::Plan(sel) => plan(&cli, sel),
        Commands::Verify => verify(&cli),
        Commands::Doctor => doctor(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report_error(&e)),
    }
}

/// 输出错误并返回退出码。
///
/// 安装错误会带上 `kind=` 与 `component=`，便于调用方解析。
fn report_error(e: &anyhow::Error) -> u8 {
    let install_error = e
        .downcast_ref::<InstallFailure>()
        .map(|f| &f.error)
        .or_else(|| e.downcast_ref::<InstallError>());
    match install_error {
        Some(ie) => {
            let component = ie.component_id().unwrap_or("-");
            eprintln!("error: kind={} component={}: {ie}", ie.kind(), component);
            ie.kind().exit_code()
        }
        None => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

/// 读取并解析安装清单（JSON）。
///
/// 异常处理：
/// - 文件读取失败（不存在/权限/IO）返回错误
/// - JSON 解析失败返回错误
fn load_manifest(path: &Path) -> Result<ToolkitManifest> {
    let bytes = std::fs::read(path).with_context(|| format!("读取清单失败: {}", path.display()))?;
    let manifest: ToolkitManifest =
        serde_json::from_slice(&bytes).context("解析清单 JSON 失败")?;
    Ok(manifest)
}

/// 清单所在目录（相对路径的基准目录）。
fn base_dir(cli: &Cli) -> PathBuf {
    cli.manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 清单与目录（已校验）。
struct Loaded {
    manifest: ToolkitManifest,
    catalog: Catalog,
    base_dir: PathBuf,
    tools_root: PathBuf,
}

fn load(cli: &Cli) -> Result<Loaded> {
    let manifest = load_manifest(&cli.manifest)?;
    let base_dir = base_dir(cli);
    let catalog = Catalog::from_manifest(&manifest, &base_dir)?;
    let tools_root = paths::resolve_path(&base_dir, &manifest.tools_root)?;
    Ok(Loaded {
        manifest,
        catalog,
        base_dir,
        tools_root,
    })
}

/// 启动项根目录：清单覆盖优先，其余取系统默认位置。
fn link_roots(loaded: &Loaded) -> Result<LinkRoots> {
    let overrides = &loaded.manifest.shortcut_roots;
    let group = loaded.manifest.shortcut_group.as_str();
    let programs = overrides
        .programs
        .as_deref()
        .map(|raw| paths::resolve_path(&loaded.base_dir, raw))
        .transpose()?;
    let send_to = overrides
        .send_to
        .as_deref()
        .map(|raw| paths::resolve_path(&loaded.base_dir, raw))
        .transpose()?;

    if let (Some(programs), Some(send_to)) = (&programs, &send_to) {
        return Ok(LinkRoots {
            program_group: programs.join(group),
            send_to: send_to.clone(),
        });
    }
    let defaults = link::default_link_roots(group)?;
    Ok(LinkRoots {
        program_group: programs.map_or(defaults.program_group, |p| p.join(group)),
        send_to: send_to.unwrap_or(defaults.send_to),
    })
}

/// 由命令行与清单默认值构造安装上下文（宿主架构只在此处检测一次）。
fn build_context(loaded: &Loaded, sel: &SelectionArgs) -> Result<InstallContext> {
    let install_type = sel
        .install_type
        .or(loaded.manifest.default_install_type)
        .unwrap_or(InstallType::Full);
    let platform = arch::detect_host_platform()?;
    Ok(InstallContext::new(platform, install_type).with_selected(sel.components.iter().cloned()))
}

/// 执行安装流程。
///
/// 主要步骤：
/// 1) 加载并校验清单
/// 2) 获取单实例锁（可关闭）
/// 3) 构造安装上下文并执行安装驱动
/// 4) 到达 `Done` 后落盘 `install-state.json`
///
/// 异常处理：
/// - 任一组件失败即整体失败；已落盘内容保留，修复后重新运行即可
fn install(cli: &Cli, sel: &SelectionArgs) -> Result<()> {
    let loaded = load(cli)?;
    let _lock = if cli.disable_mutex_check {
        info!("已关闭单实例检查，允许多个实例同时运行");
        None
    } else {
        Some(InstanceLock::acquire(&paths::lock_file(&loaded.base_dir))?)
    };

    let context = build_context(&loaded, sel)?;
    let roots = link_roots(&loaded)?;
    info!(
        "开始安装: {} {}（类型 {}，平台 {}）",
        loaded.manifest.product_name,
        loaded.manifest.version,
        context.install_type(),
        context.platform().as_str()
    );

    let platform = context.platform();
    let install_type = context.install_type();
    let report = Installer::new(&loaded.catalog, context, roots, &SystemLinkWriter).run()?;

    let mut state = InstallState::new(
        loaded.manifest.product_name.clone(),
        loaded.manifest.version.clone(),
        platform,
        install_type,
    );
    fill_state(&mut state, &report)?;
    persist_state(&loaded.tools_root, &state)?;

    info!(
        "安装完成: {} 个组件, {} 个文件, {} 字节, {} 个启动项",
        report.selection.len(),
        report.files_copied(),
        report.bytes_copied(),
        report.shortcuts.len()
    );
    Ok(())
}

/// 将安装结果写入状态（计算各组件目标目录摘要）。
fn fill_state(state: &mut InstallState, report: &InstallReport) -> Result<()> {
    for (component, result) in report.selection.iter().zip(&report.materialized) {
        let digest = match &result.destination {
            Some(dst) => Some(
                materialize::tree_digest(dst)
                    .with_context(|| format!("计算目录摘要失败: {}", dst.display()))?,
            ),
            None => None,
        };
        state.components.push(InstalledComponent {
            id: component.id.clone(),
            display_name: component.display_name.clone(),
            destination: result
                .destination
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            files_copied: result.files_copied,
            digest,
        });
    }
    for s in &report.shortcuts {
        state.created_shortcuts.push(CreatedShortcut {
            component_id: s.entry.owning_component.clone(),
            location: s.entry.location.as_str().to_string(),
            path: s.link_path.to_string_lossy().to_string(),
            target: s.entry.target_executable.to_string_lossy().to_string(),
        });
    }
    Ok(())
}

/// 将安装状态序列化并写入工具根目录。
fn persist_state(tools_root: &Path, state: &InstallState) -> Result<()> {
    paths::ensure_dir(tools_root)?;
    let path = paths::state_file(tools_root);
    let bytes = serde_json::to_vec_pretty(state).context("序列化 install-state.json 失败")?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("写入状态文件失败: {}", path.display()))?;
    Ok(())
}

/// 列出全部组件：`<显示名> (<ID>) [<类型>] = <是否已落盘>`。
fn list(cli: &Cli) -> Result<()> {
    let loaded = load(cli)?;
    for c in loaded.catalog.list_components() {
        let groups: Vec<&str> = c.group.iter().map(|t| t.as_str()).collect();
        let installed = match &c.dest_path {
            Some(dst) => dst.exists().to_string(),
            None => "-".to_string(),
        };
        println!(
            "{} ({}) [{}] = {}",
            c.display_name,
            c.id,
            groups.join(","),
            installed
        );
    }
    Ok(())
}

/// 输出安装计划（不做任何修改）。
fn plan(cli: &Cli, sel: &SelectionArgs) -> Result<()> {
    let loaded = load(cli)?;
    let context = build_context(&loaded, sel)?;
    let roots = link_roots(&loaded)?;
    let selection = loaded.catalog.resolve_for(&context)?;

    println!(
        "type = {}, platform = {}",
        context.install_type(),
        context.platform().as_str()
    );
    for c in &selection {
        match &c.dest_path {
            Some(dst) => println!("component {} ({}) -> {}", c.display_name, c.id, dst.display()),
            None => println!("component {} ({})", c.display_name, c.id),
        }
        if let Some(src) = &c.source_path {
            if !src.exists() {
                warn!("源目录不存在: {} ({})", c.id, src.display());
            }
        }
        let templates = loaded.catalog.templates_for(&c.id);
        for entry in shortcut::plan(c, templates, &context, &roots)? {
            println!(
                "shortcut [{}] {} -> {}",
                entry.location.as_str(),
                entry.display_path,
                entry.target_executable.display()
            );
        }
    }
    Ok(())
}

/// 按 `install-state.json` 校验已落盘组件。
///
/// 输出：每个组件一行 `<显示名> (<ID>) = ok|modified|missing`。
///
/// 异常处理：
/// - 状态文件不存在或无法解析返回错误
/// - 存在不一致的组件时返回错误（退出码 1）
fn verify(cli: &Cli) -> Result<()> {
    let loaded = load(cli)?;
    let state_path = paths::state_file(&loaded.tools_root);
    let bytes = std::fs::read(&state_path)
        .with_context(|| format!("读取 install-state.json 失败: {}", state_path.display()))?;
    let state: InstallState =
        serde_json::from_slice(&bytes).context("解析 install-state.json 失败")?;

    let mut drifted = 0usize;
    for c in &state.components {
        let (Some(dst), Some(expected)) = (&c.destination, &c.digest) else {
            continue;
        };
        let dst = PathBuf::from(dst);
        let status = if !dst.exists() {
            "missing"
        } else if materialize::tree_digest(&dst)
            .with_context(|| format!("计算目录摘要失败: {}", dst.display()))?
            == *expected
        {
            "ok"
        } else {
            "modified"
        };
        if status != "ok" {
            drifted += 1;
        }
        println!("{} ({}) = {}", c.display_name, c.id, status);
    }
    if drifted > 0 {
        return Err(anyhow!("校验失败: {drifted} 个组件与安装记录不一致"));
    }
    Ok(())
}

/// 环境自检（用于排障）。
fn doctor(cli: &Cli) -> Result<()> {
    println!("platform = {}", arch::detect_host_platform()?.as_str());
    println!(
        "cpu_arch = {}",
        arch::host_cpu_arch().unwrap_or_else(|| "unknown".to_string())
    );
    if let Ok(forced) = std::env::var(arch::FORCE_ARCH_ENV) {
        println!("{} = {}", arch::FORCE_ARCH_ENV, forced);
    }
    match load(cli) {
        Ok(loaded) => {
            let roots = link_roots(&loaded)?;
            println!("tools_root = {}", loaded.tools_root.display());
            println!("program_group = {}", roots.program_group.display());
            println!("send_to = {}", roots.send_to.display());
            println!(
                "lock_present = {}",
                paths::lock_file(&loaded.base_dir).exists()
            );
        }
        Err(e) => println!("manifest = {e:#}"),
    }
    Ok(())
}
