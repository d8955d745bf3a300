//! 启动项写入与默认根目录。
//!
//! 实现方式：
//! - Windows：COM `IShellLinkW` + `IPersistFile::Save` 生成 `.lnk`；
//!   根目录取 Known Folder（Programs / SendTo）
//! - 其他平台：生成 freedesktop `.desktop` 文件；
//!   根目录取 `$XDG_DATA_HOME`（缺省 `~/.local/share`）
//!
//! 安全注意：
//! - 启动项名称来自清单，已在核心库拒绝 `.`/`..` 片段，此处只在给定目录下写文件
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::PathBuf;

use anyhow::{Context, Result};
use toolkit_core::shortcut::{LinkRoots, LinkWriter, ShortcutEntry};

/// 系统启动项写入器。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinkWriter;

impl LinkWriter for SystemLinkWriter {
    fn write_link(&self, entry: &ShortcutEntry) -> Result<PathBuf> {
        std::fs::create_dir_all(&entry.link_dir)
            .with_context(|| format!("创建快捷方式目录失败: {}", entry.link_dir.display()))?;
        imp::write_link(entry)
    }
}

/// 默认启动项根目录。
///
/// 参数：
/// - `group_name`：程序组名称（`{group}` 展开为 `<Programs>/<group_name>`）
///
/// 异常处理：
/// - Windows Known Folder 查询失败，或非 Windows 下无法确定用户数据目录时返回错误
pub fn default_link_roots(group_name: &str) -> Result<LinkRoots> {
    let (programs, send_to) = imp::default_roots()?;
    Ok(LinkRoots {
        program_group: programs.join(group_name),
        send_to,
    })
}

#[cfg(windows)]
mod imp {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use toolkit_core::shortcut::ShortcutEntry;
    use windows::core::{Interface, GUID, PCWSTR, PWSTR};
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, IPersistFile,
        CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED,
    };
    use windows::Win32::UI::Shell::{
        FOLDERID_Programs, FOLDERID_SendTo, IShellLinkW, SHGetKnownFolderPath, ShellLink,
        KF_FLAG_DEFAULT,
    };

    pub(super) fn write_link(entry: &ShortcutEntry) -> Result<PathBuf> {
        let link_path = entry.link_dir.join(format!("{}.lnk", entry.name));

        unsafe {
            // ShellLink 相关 COM 接口要求 STA。
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .context("COM 初始化失败")?;
            let _guard = ComGuard;

            let link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)
                .context("创建 ShellLink 实例失败")?;

            link.SetPath(PCWSTR(to_wide(entry.target_executable.as_os_str()).as_ptr()))
                .context("设置快捷方式路径失败")?;
            link.SetWorkingDirectory(PCWSTR(to_wide(entry.working_dir.as_os_str()).as_ptr()))
                .context("设置快捷方式工作目录失败")?;

            let persist: IPersistFile = link.cast().context("获取 IPersistFile 失败")?;
            persist
                .Save(PCWSTR(to_wide(link_path.as_os_str()).as_ptr()), true)
                .context("保存快捷方式失败")?;
        }

        Ok(link_path)
    }

    pub(super) fn default_roots() -> Result<(PathBuf, PathBuf)> {
        Ok((known_folder(&FOLDERID_Programs)?, known_folder(&FOLDERID_SendTo)?))
    }

    fn known_folder(folder_id: &GUID) -> Result<PathBuf> {
        unsafe {
            let path_ptr: PWSTR = SHGetKnownFolderPath(folder_id, KF_FLAG_DEFAULT, None)
                .context("读取 Known Folder 失败")?;
            // 返回的内存由 COM 分配，必须用 CoTaskMemFree 释放。
            let _guard = CoTaskMemGuard(path_ptr);
            let s = path_ptr.to_string().context("Known Folder 路径解码失败")?;
            Ok(PathBuf::from(s))
        }
    }

    /// UTF-16 编码并追加 NUL 结尾。
    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    struct ComGuard;
    impl Drop for ComGuard {
        fn drop(&mut self) {
            unsafe { CoUninitialize() }
        }
    }

    struct CoTaskMemGuard(PWSTR);
    impl Drop for CoTaskMemGuard {
        fn drop(&mut self) {
            unsafe {
                if !self.0.is_null() {
                    CoTaskMemFree(Some(self.0 .0 as *const core::ffi::c_void));
                }
            }
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Context, Result};
    use toolkit_core::shortcut::ShortcutEntry;

    const DATA_SUBDIR: &str = "re-toolkit";

    pub(super) fn write_link(entry: &ShortcutEntry) -> Result<PathBuf> {
        let link_path = entry.link_dir.join(format!("{}.desktop", entry.name));
        std::fs::write(&link_path, desktop_entry(entry))
            .with_context(|| format!("写入启动项失败: {}", link_path.display()))?;
        Ok(link_path)
    }

    pub(super) fn default_roots() -> Result<(PathBuf, PathBuf)> {
        let data = match std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
            Some(v) => PathBuf::from(v),
            None => {
                let home = std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| anyhow!("无法确定用户数据目录（HOME 未设置）"))?;
                PathBuf::from(home).join(".local").join("share")
            }
        };
        Ok((
            data.join("applications"),
            data.join(DATA_SUBDIR).join("send-to"),
        ))
    }

    /// 生成 `.desktop` 内容。
    pub(super) fn desktop_entry(entry: &ShortcutEntry) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec={} %F\nPath={}\nTerminal=false\nX-Toolkit-Component={}\n",
            escape_value(&entry.name),
            escape_value(&quote_exec_arg(&entry.target_executable)),
            escape_value(&entry.working_dir.to_string_lossy()),
            escape_value(&entry.owning_component),
        )
    }

    /// Exec 字段参数引用：双引号包裹，内部 `"` `` ` `` `$` `\` 加反斜杠。
    fn quote_exec_arg(path: &Path) -> String {
        let raw = path.to_string_lossy();
        let mut out = String::with_capacity(raw.len() + 2);
        out.push('"');
        for ch in raw.chars() {
            if matches!(ch, '"' | '`' | '$' | '\\') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
        out
    }

    /// 字符串值转义（`\`、换行、制表符等）。
    fn escape_value(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        }
        out
    }
}
