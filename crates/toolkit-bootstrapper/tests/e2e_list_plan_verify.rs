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

fn manifest_json() -> &'static str {
    r#"
{
  "product_name": "TestToolkit",
  "version": "0.0.1",
  "source_root": "payload",
  "tools_root": "ToolsRoot",
  "shortcut_roots": { "programs": "links/Programs", "send_to": "links/SendTo" },
  "components": [
    { "id": "debuggers", "display_name": "Debuggers", "group": ["full", "compact"] },
    { "id": "debuggers/x64dbg", "display_name": "x64dbg", "group": ["full", "compact"],
      "source_path": "Debuggers/x64dbg", "dest_path": "Debuggers/x64dbg" },
    { "id": "monitor", "display_name": "Monitor", "group": "full" },
    { "id": "monitor/procmon", "display_name": "Process Monitor", "group": "full",
      "source_path": "Monitor/Procmon", "dest_path": "Monitor/Procmon" }
  ],
  "shortcuts": [
    { "component_id": "debuggers/x64dbg", "display_path": "{group}\\Debuggers\\x64dbg",
      "target_executable": "release/x64/x64dbg.exe", "condition": "Is64BitInstallMode" },
    { "component_id": "debuggers/x64dbg", "display_path": "{group}\\Debuggers\\x32dbg",
      "target_executable": "release/x32/x32dbg.exe" },
    { "component_id": "monitor/procmon", "display_path": "{sendto}\\Procmon",
      "target_executable": "Procmon.exe" }
  ]
}
"#
}

fn sandbox(prefix: &str) -> (PathBuf, PathBuf) {
    let root = unique_temp_dir(prefix);
    let manifest_path = root.join("toolkit-manifest.json");
    write_file(&manifest_path, manifest_json());
    let x64dbg = root.join("payload").join("Debuggers").join("x64dbg");
    write_file(&x64dbg.join("release").join("x64").join("x64dbg.exe"), "x64");
    write_file(&x64dbg.join("release").join("x32").join("x32dbg.exe"), "x32");
    write_file(
        &root.join("payload").join("Monitor").join("Procmon").join("Procmon.exe"),
        "procmon",
    );
    (root, manifest_path)
}

fn run(manifest: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_toolkit-bootstrapper");
    Command::new(exe)
        .env("TOOLKIT_FORCE_ARCH", "x86")
        .arg("--manifest")
        .arg(manifest)
        .args(args)
        .output()
        .expect("run toolkit-bootstrapper")
}

fn stdout_of(out: &Output, what: &str) -> String {
    assert!(
        out.status.success(),
        "{what} failed: status={:?}, stdout={}, stderr={}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).to_string()
}

#[test]
fn e2e_list_reports_install_state_per_component() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-list");
    let _cleanup = CleanupDir(root.clone());

    let stdout = stdout_of(&run(&manifest, &["list"]), "list");
    assert!(stdout.contains("x64dbg (debuggers/x64dbg) [full,compact] = false"), "stdout: {stdout}");
    assert!(stdout.contains("Debuggers (debuggers) [full,compact] = -"), "stdout: {stdout}");

    stdout_of(&run(&manifest, &["install", "--type", "compact"]), "install");

    let stdout = stdout_of(&run(&manifest, &["list"]), "list");
    assert!(stdout.contains("x64dbg (debuggers/x64dbg) [full,compact] = true"), "stdout: {stdout}");
    assert!(stdout.contains("Process Monitor (monitor/procmon) [full] = false"), "stdout: {stdout}");
}

#[test]
fn e2e_plan_is_dry_run_and_honors_conditions() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-plan");
    let _cleanup = CleanupDir(root.clone());

    let stdout = stdout_of(&run(&manifest, &["plan"]), "plan");
    assert!(stdout.contains("type = full, platform = x86"), "stdout: {stdout}");
    assert!(stdout.contains("component Debuggers (debuggers)"), "stdout: {stdout}");
    assert!(stdout.contains("component Process Monitor (monitor/procmon)"), "stdout: {stdout}");
    assert!(stdout.contains("x32dbg"), "stdout: {stdout}");
    assert!(!stdout.contains("x64dbg.exe"), "stdout: {stdout}");
    assert!(stdout.contains("shortcut [send_to]"), "stdout: {stdout}");

    assert!(!root.join("ToolsRoot").exists());
    assert!(!root.join("links").exists());
}

#[test]
fn e2e_verify_detects_modified_component() {
    let (root, manifest) = sandbox("toolkit-bootstrapper-verify");
    let _cleanup = CleanupDir(root.clone());

    // 未安装时没有状态文件。
    assert_eq!(run(&manifest, &["verify"]).status.code(), Some(1));

    stdout_of(&run(&manifest, &["install"]), "install");
    let stdout = stdout_of(&run(&manifest, &["verify"]), "verify");
    assert!(stdout.contains("x64dbg (debuggers/x64dbg) = ok"), "stdout: {stdout}");
    assert!(stdout.contains("Process Monitor (monitor/procmon) = ok"), "stdout: {stdout}");

    write_file(
        &root.join("ToolsRoot").join("Monitor").join("Procmon").join("Procmon.exe"),
        "tampered",
    );
    let out = run(&manifest, &["verify"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("x64dbg (debuggers/x64dbg) = ok"), "stdout: {stdout}");
    assert!(stdout.contains("Process Monitor (monitor/procmon) = modified"), "stdout: {stdout}");

    // 重新安装即可修复。
    stdout_of(&run(&manifest, &["install"]), "install");
    let stdout = stdout_of(&run(&manifest, &["verify"]), "verify");
    assert!(stdout.contains("Process Monitor (monitor/procmon) = ok"), "stdout: {stdout}");
}

struct CleanupDir(PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
