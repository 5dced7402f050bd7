//! Application file assembly: the loader script, the core bundle
//! concatenation, and the component registry.

use std::collections::BTreeMap;

use serde::Serialize;
use strata_common::paths::join;
use strata_common::{InternalError, StrataResult};
use strata_config::ResolvedConfig;

use crate::build_ctx::BuildCtx;
use crate::bundle::Bundle;
use crate::ctx::CompilerCtx;

#[derive(Debug, Serialize)]
struct Registry<'a> {
    namespace: &'a str,
    components: Vec<RegistryEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct RegistryEntry<'a> {
    tag: &'a str,
    bundle: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

/// Assembles the app-level output files and queues them into the www
/// build directory. The distribution gets its copy at write time.
///
/// Files that are unchanged since the previous build are still queued
/// (the write buffer elides them); only changed files count toward
/// `app_file_build_count`.
pub fn generate_app_files(
    config: &ResolvedConfig,
    ctx: &mut CompilerCtx,
    build_ctx: &mut BuildCtx,
    bundles: &[Bundle],
) -> StrataResult<()> {
    let ns_lower = config.namespace.to_lowercase();

    let mut files: BTreeMap<String, String> = BTreeMap::new();
    files.insert(format!("{ns_lower}.js"), loader_text(config));
    files.insert(format!("{ns_lower}.core.js"), core_text(config, bundles));
    files.insert(format!("{ns_lower}.registry.json"), registry_text(config, bundles)?);

    for (name, content) in &files {
        if ctx.app_files.get(name) != Some(content) {
            build_ctx.app_file_build_count += 1;
        }

        if config.generate_www {
            ctx.fs.write_file(&join(&config.build_dir, name), content);
        }
    }

    for (name, content) in files {
        ctx.app_files.insert(name, content);
    }

    Ok(())
}

fn loader_text(config: &ResolvedConfig) -> String {
    format!(
        "/* {ns} loader */\n(function(){{document.head.appendChild(Object.assign(document.createElement('script'),{{src:'{lower}.core.js'}}));}})();\n",
        ns = config.namespace,
        lower = config.namespace.to_lowercase()
    )
}

fn core_text(config: &ResolvedConfig, bundles: &[Bundle]) -> String {
    let mut out = format!("/* {} core */\n", config.namespace);
    for bundle in bundles {
        out.push_str(&bundle.compiled_module_text);
    }
    out
}

fn registry_text(config: &ResolvedConfig, bundles: &[Bundle]) -> StrataResult<String> {
    let mut components = Vec::new();
    for bundle in bundles {
        for module in &bundle.module_files {
            let Some(meta) = &module.cmp_meta else {
                continue;
            };
            components.push(RegistryEntry {
                tag: &meta.tag,
                bundle: &bundle.entry_key,
                style: bundle.styles.get(&meta.tag).map(String::as_str),
            });
        }
    }
    components.sort_by(|a, b| a.tag.cmp(b.tag));

    let registry = Registry {
        namespace: &config.namespace,
        components,
    };
    serde_json::to_string_pretty(&registry)
        .map_err(|err| InternalError::new(format!("registry serialize failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_ctx::BuildCtx;
    use crate::bundle::resolve_bundles;
    use crate::ctx::{ComponentMeta, ModuleFile};
    use std::sync::Arc;
    use strata_config::load_config_from_str;
    use strata_diagnostics::Logger;
    use strata_fs::{DiskFs, NativeFs, VirtualFs};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ResolvedConfig, CompilerCtx) {
        let tmp = TempDir::new().unwrap();
        let parsed = load_config_from_str(
            r#"
[project]
name = "demo"
namespace = "Demo"
"#,
        )
        .unwrap();
        let config = ResolvedConfig::new(&parsed, tmp.path());

        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        let fs = Arc::new(VirtualFs::new(disk));
        let ctx = CompilerCtx::with_fs(&config, Logger::default(), fs);
        (tmp, config, ctx)
    }

    fn insert_module(ctx: &mut CompilerCtx, config: &ResolvedConfig, tag: &str) {
        let src_path = join(&config.src_dir, &format!("{tag}.tsx"));
        ctx.module_files.insert(
            src_path.clone(),
            ModuleFile {
                src_path,
                js_text: format!("// {tag}\n"),
                cmp_meta: Some(ComponentMeta {
                    tag: tag.to_string(),
                    style_url: None,
                    styles: Some(format!(":host {{ --tag: {tag} }}")),
                }),
            },
        );
    }

    #[test]
    fn writes_loader_core_and_registry_into_build_dir() {
        let (_tmp, config, mut ctx) = fixture();
        insert_module(&mut ctx, &config, "my-card");

        let mut build_ctx = BuildCtx::new(&mut ctx, None);
        let mut diags = Vec::new();
        let mut bundles = resolve_bundles(&[], &ctx, &mut diags);
        bundles[0].compiled_module_text = "// my-card\n".to_string();
        bundles[0]
            .styles
            .insert("my-card".to_string(), ":host{}".to_string());

        generate_app_files(&config, &mut ctx, &mut build_ctx, &bundles).unwrap();

        let core = ctx
            .fs
            .read_file(&join(&config.build_dir, "demo.core.js"))
            .unwrap();
        assert!(core.starts_with("/* Demo core */\n"));
        assert!(core.contains("// my-card"));

        let registry = ctx
            .fs
            .read_file(&join(&config.build_dir, "demo.registry.json"))
            .unwrap();
        assert!(registry.contains("\"tag\": \"my-card\""));
        assert!(registry.contains("\"bundle\": \"my-card\""));
        assert!(registry.contains("\"style\": \":host{}\""));

        assert_eq!(build_ctx.app_file_build_count, 3);
    }

    #[test]
    fn unchanged_app_files_do_not_count_as_rebuilt() {
        let (_tmp, config, mut ctx) = fixture();
        insert_module(&mut ctx, &config, "my-card");

        let mut diags = Vec::new();

        let mut first = BuildCtx::new(&mut ctx, None);
        let bundles = resolve_bundles(&[], &ctx, &mut diags);
        generate_app_files(&config, &mut ctx, &mut first, &bundles).unwrap();
        assert_eq!(first.app_file_build_count, 3);

        let mut second = BuildCtx::new(&mut ctx, None);
        let bundles = resolve_bundles(&[], &ctx, &mut diags);
        generate_app_files(&config, &mut ctx, &mut second, &bundles).unwrap();
        assert_eq!(second.app_file_build_count, 0);
    }

    #[test]
    fn registry_components_are_sorted_by_tag() {
        let (_tmp, config, mut ctx) = fixture();
        insert_module(&mut ctx, &config, "z-widget");
        insert_module(&mut ctx, &config, "a-widget");

        let mut build_ctx = BuildCtx::new(&mut ctx, None);
        let mut diags = Vec::new();
        let bundles = resolve_bundles(&[], &ctx, &mut diags);

        generate_app_files(&config, &mut ctx, &mut build_ctx, &bundles).unwrap();

        let registry = ctx
            .fs
            .read_file(&join(&config.build_dir, "demo.registry.json"))
            .unwrap();
        let a = registry.find("a-widget").unwrap();
        let z = registry.find("z-widget").unwrap();
        assert!(a < z);
    }
}
