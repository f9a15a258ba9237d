//! core::config::loader
//!
//! Filesystem-backed configuration: one `stackgen.toml` per directory.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::schema::DirConfig;
use super::{
    BackendBlock, CodegenConfig, ConfigResolver, GenHclBlock, Globals, ResolveError, StackLister,
    CONFIG_FILENAME,
};
use crate::core::eval::{Evaluator, Expr, Namespace, TemplateEvaluator};
use crate::core::stack::{project_path, Stack};

/// Resolves configuration from `stackgen.toml` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        Self
    }

    /// Load the config declared directly in `dir`, if any.
    pub fn load_dir(dir: &Path) -> Result<Option<DirConfig>, ResolveError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| ResolveError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let cfg: DirConfig = toml::from_str(&contents).map_err(|e| ResolveError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let invalid = |message: String| ResolveError::InvalidValue {
            path: path.clone(),
            message,
        };
        if let Some(generate) = cfg.config.as_ref().and_then(|c| c.generate.as_ref()) {
            generate.validate().map_err(invalid)?;
        }
        for decl in &cfg.generate_hcl {
            decl.validate().map_err(invalid)?;
        }

        Ok(Some(cfg))
    }

    /// Configs from `root` down to `dir` (inclusive), root first.
    fn chain(root: &Path, dir: &Path) -> Result<Vec<(PathBuf, DirConfig)>, ResolveError> {
        let rel = dir
            .strip_prefix(root)
            .map_err(|_| ResolveError::InvalidValue {
                path: dir.to_path_buf(),
                message: format!("directory is outside project root '{}'", root.display()),
            })?;

        let mut current = root.to_path_buf();
        let mut dirs = vec![current.clone()];
        for component in rel.components() {
            current.push(component);
            dirs.push(current.clone());
        }

        let mut chain = Vec::new();
        for d in dirs {
            if let Some(cfg) = Self::load_dir(&d)? {
                chain.push((d, cfg));
            }
        }
        Ok(chain)
    }

    fn walk(root: &Path, dir: &Path, stacks: &mut Vec<Stack>) -> Result<(), ResolveError> {
        if let Some(cfg) = Self::load_dir(dir)? {
            if let Some(decl) = cfg.stack {
                trace!(path = %dir.display(), "found stack");
                stacks.push(Stack::new(root, dir, decl.name, decl.description));
            }
        }

        let list_err = |e| ResolveError::ListError {
            path: dir.to_path_buf(),
            source: e,
        };
        let mut children = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            children.push(entry.path());
        }
        children.sort();

        for child in children {
            Self::walk(root, &child, stacks)?;
        }
        Ok(())
    }
}

impl ConfigResolver for FsResolver {
    fn codegen_config(&self, root: &Path, stack: &Stack) -> Result<CodegenConfig, ResolveError> {
        let mut cfg = CodegenConfig::default();
        for (_, dir_cfg) in Self::chain(root, stack.abs_path())? {
            let Some(generate) = dir_cfg.config.and_then(|c| c.generate) else {
                continue;
            };
            if let Some(name) = generate.backend_config_filename {
                cfg.backend_cfg_filename = name;
            }
            if let Some(name) = generate.locals_filename {
                cfg.locals_filename = name;
            }
        }
        Ok(cfg)
    }

    fn globals(&self, root: &Path, stack: &Stack) -> Result<Globals, ResolveError> {
        let mut pending: BTreeMap<String, Expr> = BTreeMap::new();
        for (dir, dir_cfg) in Self::chain(root, stack.abs_path())? {
            for (name, value) in &dir_cfg.globals {
                let expr = super::schema::to_expr(value)
                    .map_err(|e| invalid_value(&dir, format!("global '{name}': {e}")))?;
                pending.insert(name.clone(), expr);
            }
        }

        let mut ev = TemplateEvaluator::new();
        ev.set_namespace("stack", stack.meta().to_namespace())
            .map_err(|source| ResolveError::Global {
                name: String::new(),
                source,
            })?;

        // Globals may reference each other; resolve until no progress is made.
        let mut resolved = Namespace::new();
        while !pending.is_empty() {
            ev.set_namespace("global", resolved.clone())
                .map_err(|source| ResolveError::Global {
                    name: String::new(),
                    source,
                })?;

            let before = pending.len();
            let mut first_err = None;
            let mut unresolved = BTreeMap::new();
            for (name, expr) in std::mem::take(&mut pending) {
                match ev.eval(&expr) {
                    Ok(value) => {
                        resolved.insert(name, value);
                    }
                    Err(source) => {
                        if first_err.is_none() {
                            first_err = Some(ResolveError::Global {
                                name: name.clone(),
                                source,
                            });
                        }
                        unresolved.insert(name, expr);
                    }
                }
            }

            let progressed = unresolved.len() < before;
            pending = unresolved;
            if let Some(err) = first_err.filter(|_| !progressed) {
                return Err(err);
            }
        }

        Ok(Globals::new(resolved))
    }

    fn backend(&self, dir: &Path) -> Result<Option<BackendBlock>, ResolveError> {
        let Some(decl) = Self::load_dir(dir)?.and_then(|cfg| cfg.backend) else {
            return Ok(None);
        };
        let body = decl
            .body()
            .map_err(|e| invalid_value(dir, format!("backend: {e}")))?;
        Ok(Some(BackendBlock {
            labels: decl.labels,
            body,
        }))
    }

    fn exported_locals(
        &self,
        root: &Path,
        stack: &Stack,
    ) -> Result<HashMap<String, Expr>, ResolveError> {
        let mut locals = HashMap::new();
        for (dir, dir_cfg) in Self::chain(root, stack.abs_path())? {
            for (name, value) in &dir_cfg.export_as_locals {
                let expr = super::schema::to_expr(value)
                    .map_err(|e| invalid_value(&dir, format!("local '{name}': {e}")))?;
                locals.insert(name.clone(), expr);
            }
        }
        Ok(locals)
    }

    fn generate_hcl(&self, root: &Path, stack: &Stack) -> Result<Vec<GenHclBlock>, ResolveError> {
        let mut blocks: Vec<GenHclBlock> = Vec::new();
        for (dir, dir_cfg) in Self::chain(root, stack.abs_path())? {
            let origin = project_path(root, &dir.join(CONFIG_FILENAME));
            let declared: HashSet<&str> =
                dir_cfg.generate_hcl.iter().map(|d| d.name.as_str()).collect();

            // Nearer declarations replace ancestors' blocks of the same name.
            blocks.retain(|b| !declared.contains(b.name.as_str()));
            for decl in &dir_cfg.generate_hcl {
                let body = decl.body().map_err(|e| {
                    invalid_value(&dir, format!("generate_hcl '{}': {e}", decl.name))
                })?;
                blocks.push(GenHclBlock {
                    name: decl.name.clone(),
                    origin: origin.clone(),
                    body,
                });
            }
        }
        Ok(blocks)
    }
}

fn invalid_value(dir: &Path, message: String) -> ResolveError {
    ResolveError::InvalidValue {
        path: dir.join(CONFIG_FILENAME),
        message,
    }
}

impl StackLister for FsResolver {
    fn list_stacks(&self, root: &Path) -> Result<Vec<Stack>, ResolveError> {
        let mut stacks = Vec::new();
        Self::walk(root, root, &mut stacks)?;
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, dir: &str, contents: &str) -> PathBuf {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILENAME), contents).unwrap();
        dir
    }

    fn stack_at(root: &Path, dir: &str) -> Stack {
        let path = write(root, dir, "[stack]\n");
        Stack::new(root, path, None, None)
    }

    #[test]
    fn lists_stacks_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "b", "[stack]\n");
        write(root, "a/nested", "[stack]\nname = \"inner\"\n");
        write(root, "a", "[stack]\n");
        write(root, "c", "[globals]\nx = 1\n");
        write(root, ".hidden", "[stack]\n");

        let stacks = FsResolver::new().list_stacks(root).unwrap();
        let paths: Vec<&str> = stacks.iter().map(|s| s.meta().path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/a/nested", "/b"]);
        assert_eq!(stacks[1].meta().name, "inner");
    }

    #[test]
    fn parse_errors_carry_path() {
        let temp = TempDir::new().unwrap();
        let dir = write(temp.path(), "s", "[stack\n");
        let err = FsResolver::load_dir(&dir).unwrap_err();
        assert!(matches!(err, ResolveError::ParseError { .. }));
        assert!(err.to_string().contains(CONFIG_FILENAME));
    }

    #[test]
    fn codegen_config_nearest_wins() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(
            root,
            "",
            "[config.generate]\nbackend_config_filename = \"backend.tf\"\nlocals_filename = \"locals.tf\"\n",
        );
        let stack = stack_at(root, "stacks/app");
        write(
            root,
            "stacks/app",
            "[stack]\n[config.generate]\nlocals_filename = \"app_locals.tf\"\n",
        );

        let cfg = FsResolver::new().codegen_config(root, &stack).unwrap();
        assert_eq!(cfg.backend_cfg_filename, "backend.tf");
        assert_eq!(cfg.locals_filename, "app_locals.tf");
    }

    #[test]
    fn codegen_config_defaults() {
        let temp = TempDir::new().unwrap();
        let stack = stack_at(temp.path(), "app");
        let cfg = FsResolver::new().codegen_config(temp.path(), &stack).unwrap();
        assert_eq!(cfg, CodegenConfig::default());
    }

    #[test]
    fn invalid_filename_rejected() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "", "[config.generate]\nlocals_filename = \"../x.tf\"\n");
        let stack = stack_at(root, "app");

        let err = FsResolver::new().codegen_config(root, &stack).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { .. }));
    }

    #[test]
    fn globals_merge_and_reference_each_other() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(
            root,
            "",
            "[globals]\nenv = \"prod\"\nbucket = \"${global.env}-${global.project}\"\nproject = \"acme\"\n",
        );
        let stack = stack_at(root, "app");
        write(
            root,
            "app",
            "[stack]\n[globals]\nproject = \"${stack.name}\"\nreplicas = 2\n",
        );

        let globals = FsResolver::new().globals(root, &stack).unwrap();
        let attrs = globals.attributes();
        assert_eq!(attrs["env"], json!("prod"));
        assert_eq!(attrs["project"], json!("app"));
        assert_eq!(attrs["bucket"], json!("prod-app"));
        assert_eq!(attrs["replicas"], json!(2));
    }

    #[test]
    fn undefined_global_reference_fails() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let stack = stack_at(root, "app");
        write(root, "app", "[stack]\n[globals]\na = \"${global.missing}\"\n");

        let err = FsResolver::new().globals(root, &stack).unwrap_err();
        assert!(matches!(err, ResolveError::Global { ref name, .. } if name == "a"));
    }

    #[test]
    fn backend_is_per_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "", "[backend]\nlabels = [\"gcs\"]\n");
        let stack = stack_at(root, "app");

        let resolver = FsResolver::new();
        assert!(resolver.backend(stack.abs_path()).unwrap().is_none());
        let backend = resolver.backend(root).unwrap().unwrap();
        assert_eq!(backend.labels, vec!["gcs".to_string()]);
    }

    #[test]
    fn generate_hcl_nearest_replaces_ancestor() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(
            root,
            "",
            "[[generate_hcl]]\nname = \"a.tf\"\n[[generate_hcl]]\nname = \"b.tf\"\n",
        );
        let stack = stack_at(root, "app");
        write(
            root,
            "app",
            "[stack]\n[[generate_hcl]]\nname = \"a.tf\"\n[generate_hcl.attributes]\nx = 1\n",
        );

        let blocks = FsResolver::new().generate_hcl(root, &stack).unwrap();
        let names: Vec<(&str, &str)> = blocks
            .iter()
            .map(|b| (b.name.as_str(), b.origin.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("b.tf", "/stackgen.toml"), ("a.tf", "/app/stackgen.toml")]
        );
    }

    #[test]
    fn generate_hcl_keeps_same_file_duplicates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let stack = stack_at(root, "app");
        write(
            root,
            "app",
            "[stack]\n[[generate_hcl]]\nname = \"a.tf\"\n[[generate_hcl]]\nname = \"a.tf\"\n",
        );

        let blocks = FsResolver::new().generate_hcl(root, &stack).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn exported_locals_child_overrides() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "", "[export_as_locals]\na = 1\nb = 2\n");
        let stack = stack_at(root, "app");
        write(root, "app", "[stack]\n[export_as_locals]\nb = 3\n");

        let locals = FsResolver::new().exported_locals(root, &stack).unwrap();
        assert_eq!(locals.len(), 2);
        assert_eq!(locals["b"], Expr::Literal(json!(3)));
    }

    #[test]
    fn non_finite_values_are_invalid() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let stack = stack_at(root, "app");
        write(root, "app", "[stack]\n[export_as_locals]\na = inf\nb = nan\n");

        let err = FsResolver::new().exported_locals(root, &stack).unwrap_err();
        match err {
            ResolveError::InvalidValue { path, message } => {
                assert_eq!(path, stack.abs_path().join(CONFIG_FILENAME));
                assert!(message.contains("non-finite"));
            }
            other => panic!("expected invalid value, got {other:?}"),
        }

        write(root, "", "[backend]\nlabels = [\"gcs\"]\n[backend.attributes]\nx = -inf\n");
        let err = FsResolver::new().backend(root).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { .. }));
    }
}
