use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use uuid::Uuid;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent"))
        .unwrap_or_else(|e| panic!("create parent for {} failed: {e}", path.display()));
    std::fs::write(path, content).unwrap_or_else(|e| panic!("write {} failed: {e}", path.display()));
}

const MANIFEST: &str = r#"
{
  "product_name": "TestToolkit",
  "version": "0.0.1",
  "source_root": "payload",
  "tools_root": "ToolsRoot",
  "shortcut_group": "Test Toolkit",
  "default_install_type": "full",
  "shortcut_roots": { "programs": "links/Programs", "send_to": "links/SendTo" },
  "components": [
    { "id": "hexeditor", "display_name": "HEX Editor", "group": ["full", "compact"] },
    { "id": "hexeditor/hxd", "display_name": "HxD", "group": ["full", "compact"],
      "source_path": "HEX Editor\\HxD", "dest_path": "HEX Editor\\HxD" },
    { "id": "unpacking", "display_name": "Unpacking", "group": "custom" },
    { "id": "unpacking/upx", "display_name": "UPX", "group": "custom",
      "source_path": "Unpacking/UPX", "dest_path": "Unpacking/UPX" }
  ],
  "shortcuts": [
    { "component_id": "hexeditor/hxd", "display_path": "{group}\\HEX Editor\\HxD",
      "target_executable": "HxD64.exe", "condition": "Is64BitInstallMode" },
    { "component_id": "hexeditor/hxd", "display_path": "{group}\\HEX Editor\\HxD",
      "target_executable": "HxD32.exe", "condition": "not Is64BitInstallMode" },
    { "component_id": "hexeditor/hxd", "display_path": "{sendto}\\HxD",
      "target_executable": "HxD64.exe", "condition": "Is64BitInstallMode" },
    { "component_id": "hexeditor/hxd", "display_path": "{sendto}\\HxD",
      "target_executable": "HxD32.exe", "condition": "not Is64BitInstallMode" },
    { "component_id": "unpacking/upx", "display_path": "{group}\\Unpacking\\UPX",
      "target_executable": "upx.exe" }
  ]
}
"#;

/// 沙箱：清单 + payload（HxD 两个可执行文件，UPX 一个）。
fn sandbox(prefix: &str) -> (PathBuf, PathBuf) {
    let root = unique_temp_dir(prefix);
    let manifest_path = root.join("toolkit-manifest.json");
    write_file(&manifest_path, MANIFEST);
    let hxd = root.join("payload").join("HEX Editor").join("HxD");
    write_file(&hxd.join("HxD64.exe"), "hxd64");
    write_file(&hxd.join("HxD32.exe"), "hxd32");
    write_file(&hxd.join("lang").join("en.ini"), "[lang]");
    write_file(
        &root.join("payload").join("Unpacking").join("UPX").join("upx.exe"),
        "upx",
    );
    (root, manifest_path)
}

fn run(manifest: &Path, arch: &str, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_toolkit-bootstrapper");
    Command::new(exe)
        .env("TOOLKIT_FORCE_ARCH", arch)
        .arg("--manifest")
        .arg(manifest)
        .args(args)
        .output()
        .expect("run toolkit-bootstrapper")
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} failed: status={:?}, stdout={}, stderr={}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
}

fn link_file(dir: &Path, name: &str) -> PathBuf {
    let ext = if cfg!(windows) { "lnk" } else { "desktop" };
    dir.join(format!("{name}.{ext}"))
}

#[test]
fn e2e_install_x64_copies_files_creates_links_and_state() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-x64");
    let _cleanup = CleanupDir(root.clone());

    let out = run(&manifest, "x64", &["install"]);
    assert_success(&out, "install");

    let dest = root.join("ToolsRoot").join("HEX Editor").join("HxD");
    assert_eq!(std::fs::read_to_string(dest.join("HxD64.exe")).unwrap(), "hxd64");
    assert_eq!(std::fs::read_to_string(dest.join("lang").join("en.ini")).unwrap(), "[lang]");
    // custom 组件不在 full 中。
    assert!(!root.join("ToolsRoot").join("Unpacking").exists());

    let group_link = link_file(
        &root.join("links").join("Programs").join("Test Toolkit").join("HEX Editor"),
        "HxD",
    );
    let send_to_link = link_file(&root.join("links").join("SendTo"), "HxD");
    assert!(group_link.exists(), "missing {}", group_link.display());
    assert!(send_to_link.exists(), "missing {}", send_to_link.display());

    #[cfg(not(windows))]
    {
        let content = std::fs::read_to_string(&group_link).unwrap();
        assert!(content.contains("HxD64.exe"), "content: {content}");
        assert!(!content.contains("HxD32.exe"), "content: {content}");
    }

    let state_raw = std::fs::read_to_string(root.join("ToolsRoot").join("install-state.json"))
        .expect("install-state.json");
    let state: serde_json::Value = serde_json::from_str(&state_raw).unwrap();
    assert_eq!(state["platform"], "x64");
    assert_eq!(state["install_type"], "full");
    let ids: Vec<&str> = state["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["hexeditor", "hexeditor/hxd"]);
    assert_eq!(state["created_shortcuts"].as_array().unwrap().len(), 2);

    // 锁在运行结束后释放。
    assert!(!root.join("toolkit.lock").exists());
}

#[test]
fn e2e_install_x86_uses_32bit_launcher() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-x86");
    let _cleanup = CleanupDir(root.clone());

    let out = run(&manifest, "x86", &["install", "--type", "compact"]);
    assert_success(&out, "install");

    let group_link = link_file(
        &root.join("links").join("Programs").join("Test Toolkit").join("HEX Editor"),
        "HxD",
    );
    assert!(group_link.exists(), "missing {}", group_link.display());

    #[cfg(not(windows))]
    {
        let content = std::fs::read_to_string(&group_link).unwrap();
        assert!(content.contains("HxD32.exe"), "content: {content}");
        assert!(!content.contains("HxD64.exe"), "content: {content}");
    }
}

#[test]
fn e2e_install_explicit_component_adds_custom_tool() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-custom");
    let _cleanup = CleanupDir(root.clone());

    let out = run(
        &manifest,
        "x64",
        &["install", "--type", "custom", "--component", "unpacking/upx"],
    );
    assert_success(&out, "install");

    let tools = root.join("ToolsRoot");
    assert!(tools.join("Unpacking").join("UPX").join("upx.exe").is_file());
    assert!(!tools.join("HEX Editor").exists());
}

#[test]
fn e2e_missing_source_exits_with_source_missing_kind() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-missing");
    let _cleanup = CleanupDir(root.clone());
    std::fs::remove_dir_all(root.join("payload").join("HEX Editor")).unwrap();

    let out = run(&manifest, "x64", &["install"]);
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("kind=source_missing component=hexeditor/hxd"),
        "stderr: {stderr}"
    );
    assert!(!root.join("links").exists());
    assert!(!root.join("ToolsRoot").join("install-state.json").exists());
}

#[test]
fn e2e_unknown_component_exits_with_code_2() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-unknown");
    let _cleanup = CleanupDir(root.clone());

    let out = run(&manifest, "x64", &["install", "--component", "nope/tool"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("kind=unknown_component"), "stderr: {stderr}");
    assert!(!root.join("ToolsRoot").exists());
}

#[test]
fn e2e_live_lock_blocks_second_instance() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-e2e-lock");
    let _cleanup = CleanupDir(root.clone());
    // 当前测试进程存活，模拟另一个正在运行的实例。
    write_file(&root.join("toolkit.lock"), &std::process::id().to_string());

    let out = run(&manifest, "x64", &["install"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(&std::process::id().to_string()), "stderr: {stderr}");
    assert!(!root.join("ToolsRoot").exists());

    let out = run(&manifest, "x64", &["--disable-mutex-check", "install"]);
    assert_success(&out, "install --disable-mutex-check");
    // 关闭检查时不触碰他人的锁。
    assert!(root.join("toolkit.lock").exists());
}

struct CleanupDir(PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
