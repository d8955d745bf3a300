//! 组件目录：声明顺序、层级依赖与安装集合解析。
//!
//! 规则：
//! - 组件 ID 全局唯一；层级用 `/`（或安装脚本习惯的 `\`）分隔
//! - 子组件被选中时，其所有祖先组件一并选中，且祖先排在子组件之前
//! - 子组件的安装类型是父组件安装类型的子集（加载时校验）
//! - 祖先 ID 在目录中不存在时返回 `UnknownComponent`（此时尚未做任何文件 IO）
//!
//! 作者：逆向工具集项目组（自动生成）
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::condition;
use crate::context::{InstallContext, InstallType};
use crate::error::{InstallError, Result};
use crate::manifest::{ComponentRecord, ShortcutTemplate, ToolkitManifest};
use crate::paths;
use crate::shortcut::DisplayPath;

/// 已解析的组件（不可变值记录）。
///
/// `source_path`/`dest_path` 已按源根目录与工具根目录解析为完整路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    pub display_name: String,
    pub group: Vec<InstallType>,
    pub source_path: Option<PathBuf>,
    pub dest_path: Option<PathBuf>,
}

impl Component {
    /// 父组件 ID（顶层组件返回 `None`）。
    pub fn parent_id(&self) -> Option<&str> {
        parent_of(&self.id)
    }

    /// 是否属于任一给定安装类型。
    pub fn in_any_group(&self, types: &BTreeSet<InstallType>) -> bool {
        self.group.iter().any(|t| types.contains(t))
    }

    /// 是否为纯分组节点（无文件）。
    pub fn is_group_only(&self) -> bool {
        self.source_path.is_none()
    }
}

/// 组件目录。
#[derive(Debug, Clone)]
pub struct Catalog {
    components: Vec<Component>,
    index: HashMap<String, usize>,
    templates: Vec<ShortcutTemplate>,
}

impl Catalog {
    /// 从清单构建目录并校验。
    ///
    /// 参数：
    /// - `manifest`：安装清单
    /// - `base_dir`：清单文件所在目录（解析 `source_root`/`tools_root`）
    ///
    /// 异常处理：
    /// - 组件 ID 重复：`DuplicateComponent`
    /// - 模板引用不存在的组件：`UnknownComponent`
    /// - 路径字段不完整、显示路径前缀非法、子组件安装类型超出父组件：`ManifestInvalid`
    /// - 同一位置的两个模板可能同时生效：`ConflictingShortcuts`
    pub fn from_manifest(manifest: &ToolkitManifest, base_dir: &Path) -> Result<Self> {
        let source_root = root(base_dir, &manifest.source_root, "source_root")?;
        let tools_root = root(base_dir, &manifest.tools_root, "tools_root")?;
        let components = manifest
            .components
            .iter()
            .map(|r| resolve_record(r, &source_root, &tools_root))
            .collect::<Result<Vec<_>>>()?;
        Self::new(components, manifest.shortcuts.clone())
    }

    /// 由已解析组件与模板构建目录。
    pub fn new(components: Vec<Component>, templates: Vec<ShortcutTemplate>) -> Result<Self> {
        let mut index = HashMap::with_capacity(components.len());
        for (i, c) in components.iter().enumerate() {
            if index.insert(c.id.clone(), i).is_some() {
                return Err(InstallError::DuplicateComponent { id: c.id.clone() });
            }
        }
        let catalog = Self {
            components,
            index,
            templates,
        };
        catalog.validate_hierarchy()?;
        catalog.validate_templates()?;
        Ok(catalog)
    }

    /// 按声明顺序列出全部组件。
    pub fn list_components(&self) -> &[Component] {
        &self.components
    }

    /// 按 ID 查找组件。
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.index.get(id).map(|&i| &self.components[i])
    }

    /// 组件绑定的快捷方式模板（按声明顺序）。
    pub fn templates_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ShortcutTemplate> + 'a {
        self.templates.iter().filter(move |t| t.component_id == id)
    }

    /// 全部快捷方式模板。
    pub fn templates(&self) -> &[ShortcutTemplate] {
        &self.templates
    }

    /// 解析安装类型对应的组件集合。
    ///
    /// 返回值：
    /// - 属于任一请求类型的组件，加上其全部祖先组件；去重，目录顺序，祖先在前
    ///
    /// 异常处理：
    /// - 祖先 ID 不在目录中：`UnknownComponent`
    pub fn resolve_selection(&self, requested: &BTreeSet<InstallType>) -> Result<Vec<Component>> {
        let seeds: Vec<&str> = self
            .components
            .iter()
            .filter(|c| c.in_any_group(requested))
            .map(|c| c.id.as_str())
            .collect();
        self.expand(&seeds)
    }

    /// 解析一次安装运行的最终组件集合：安装类型对应的组件 + 用户显式勾选的组件。
    ///
    /// 异常处理：
    /// - 显式勾选的 ID 或其祖先不在目录中：`UnknownComponent`
    pub fn resolve_for(&self, context: &InstallContext) -> Result<Vec<Component>> {
        for id in context.selected() {
            if !self.index.contains_key(id.as_str()) {
                return Err(InstallError::UnknownComponent {
                    id: id.clone(),
                    referenced_by: None,
                });
            }
        }
        let requested = BTreeSet::from([context.install_type()]);
        let seeds: Vec<&str> = self
            .components
            .iter()
            .filter(|c| c.in_any_group(&requested) || context.selected().contains(&c.id))
            .map(|c| c.id.as_str())
            .collect();
        self.expand(&seeds)
    }

    /// 为每个种子补齐祖先链，并按“祖先在前、其余按目录顺序”输出。
    fn expand(&self, seeds: &[&str]) -> Result<Vec<Component>> {
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for &id in seeds {
            let mut chain = vec![id];
            let mut cur = id;
            while let Some(parent) = parent_of(cur) {
                if !self.index.contains_key(parent) {
                    return Err(InstallError::UnknownComponent {
                        id: parent.to_string(),
                        referenced_by: Some(cur.to_string()),
                    });
                }
                chain.push(parent);
                cur = parent;
            }
            for &member in chain.iter().rev() {
                if emitted.insert(member) {
                    if let Some(c) = self.get(member) {
                        out.push(c.clone());
                    }
                }
            }
        }
        Ok(out)
    }

    /// 子组件的安装类型必须是父组件安装类型的子集。
    ///
    /// 否则按子组件的类型解析时会连带选中不属于该类型的父组件。
    /// 父组件缺失不在此处报错，留给解析阶段返回 `UnknownComponent`。
    fn validate_hierarchy(&self) -> Result<()> {
        for c in &self.components {
            let Some(parent) = c.parent_id().and_then(|id| self.get(id)) else {
                continue;
            };
            if let Some(extra) = c.group.iter().find(|t| !parent.group.contains(t)) {
                return Err(InstallError::ManifestInvalid {
                    component: Some(c.id.clone()),
                    message: format!(
                        "子组件属于安装类型 {extra}，但父组件 {} 不属于该类型",
                        parent.id
                    ),
                });
            }
        }
        Ok(())
    }

    fn validate_templates(&self) -> Result<()> {
        for t in &self.templates {
            let Some(owner) = self.get(&t.component_id) else {
                return Err(InstallError::UnknownComponent {
                    id: t.component_id.clone(),
                    referenced_by: None,
                });
            };
            if owner.is_group_only() {
                return Err(InstallError::ManifestInvalid {
                    component: Some(owner.id.clone()),
                    message: format!("分组组件不能绑定快捷方式: {}", t.display_path),
                });
            }
            if t.target_executable.trim().is_empty() {
                return Err(InstallError::ManifestInvalid {
                    component: Some(owner.id.clone()),
                    message: format!("快捷方式缺少目标文件: {}", t.display_path),
                });
            }
            DisplayPath::parse(&t.display_path).map_err(|message| {
                InstallError::ManifestInvalid {
                    component: Some(owner.id.clone()),
                    message,
                }
            })?;
        }

        for (i, a) in self.templates.iter().enumerate() {
            for b in &self.templates[i + 1..] {
                if a.component_id != b.component_id || !same_display_path(a, b) {
                    continue;
                }
                if !condition::mutually_exclusive(a.condition.as_ref(), b.condition.as_ref()) {
                    return Err(InstallError::ConflictingShortcuts {
                        component: a.component_id.clone(),
                        display_path: a.display_path.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn same_display_path(a: &ShortcutTemplate, b: &ShortcutTemplate) -> bool {
    match (DisplayPath::parse(&a.display_path), DisplayPath::parse(&b.display_path)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// 层级 ID 的父 ID。
pub fn parent_of(id: &str) -> Option<&str> {
    id.rfind(['/', '\\'])
        .map(|i| &id[..i])
        .filter(|p| !p.is_empty())
}

fn root(base_dir: &Path, raw: &str, field: &str) -> Result<PathBuf> {
    paths::resolve_path(base_dir, raw).map_err(|e| InstallError::ManifestInvalid {
        component: None,
        message: format!("{field}: {e}"),
    })
}

fn resolve_record(
    record: &ComponentRecord,
    source_root: &Path,
    tools_root: &Path,
) -> Result<Component> {
    let invalid = |message: String| InstallError::ManifestInvalid {
        component: Some(record.id.clone()),
        message,
    };
    if record.id.trim().is_empty() {
        return Err(invalid("组件 ID 为空".to_string()));
    }
    if record.group.is_empty() {
        return Err(invalid("组件未声明安装类型".to_string()));
    }
    let (source_path, dest_path) = match (&record.source_path, &record.dest_path) {
        (None, None) => (None, None),
        (Some(src), Some(dst)) => (
            Some(paths::resolve_path(source_root, src).map_err(|e| invalid(format!("source_path: {e}")))?),
            Some(paths::resolve_path(tools_root, dst).map_err(|e| invalid(format!("dest_path: {e}")))?),
        ),
        _ => return Err(invalid("source_path 与 dest_path 必须同时提供".to_string())),
    };
    Ok(Component {
        id: record.id.clone(),
        display_name: record.display_name.clone(),
        group: record.group.clone(),
        source_path,
        dest_path,
    })
}
