//! Source scanning and transpilation.

use serde::{Deserialize, Serialize};

use strata_common::{InternalError, StrataResult};
use strata_config::ResolvedConfig;

use crate::build_ctx::BuildCtx;
use crate::ctx::{CompilerCtx, ComponentMeta, ModuleFile};
use crate::reconcile::is_ts_file;

/// The cacheable result of transpiling one source module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspileOutput {
    /// The transpiled module text.
    pub js_text: String,
    /// Component metadata, when the source declares a component.
    pub cmp_meta: Option<ComponentMeta>,
}

/// Scans the source directory and transpiles every TypeScript source
/// through the cache, populating the context's module map.
///
/// The directory listing is always physical so newly added files are
/// picked up; the per-module transpile is content-addressed, so an
/// unchanged module costs one cache read. `transpile_build_count`
/// counts only actual transpiles.
pub fn scan(
    config: &ResolvedConfig,
    ctx: &mut CompilerCtx,
    build_ctx: &mut BuildCtx,
) -> StrataResult<()> {
    let span = ctx
        .logger
        .create_time_span(format!("scan src: {}", config.src_dir));

    let fs = ctx.fs.clone();
    let entries = fs
        .read_dir(&config.src_dir, true)
        .map_err(|e| InternalError::new(e.to_string()))?;

    for entry in entries.iter().filter(|e| e.is_file && is_ts_file(&e.abs_path)) {
        let source = fs
            .read_file(&entry.abs_path)
            .map_err(|e| InternalError::new(e.to_string()))?;

        let key = ctx.cache.create_key("transpile", &source);
        let cached = ctx
            .cache
            .get(&key)
            .and_then(|hit| serde_json::from_str::<TranspileOutput>(&hit).ok());

        let output = match cached {
            Some(output) => output,
            None => {
                let output = transpile_module(&entry.abs_path, &source);
                build_ctx.transpile_build_count += 1;
                if let Ok(json) = serde_json::to_string(&output) {
                    ctx.cache.put(&key, &json);
                }
                output
            }
        };

        ctx.module_files.insert(
            entry.abs_path.clone(),
            ModuleFile {
                src_path: entry.abs_path.clone(),
                js_text: output.js_text,
                cmp_meta: output.cmp_meta,
            },
        );
    }

    ctx.logger.debug(format!(
        "scan finished, {} modules, {} transpiled, {} ms",
        ctx.module_files.len(),
        build_ctx.transpile_build_count,
        span.elapsed_ms()
    ));

    Ok(())
}

/// Transpiles one module: components become a registration module, any
/// other source passes through unchanged.
pub fn transpile_module(src_path: &str, source: &str) -> TranspileOutput {
    let cmp_meta = extract_component_meta(source);

    let js_text = match &cmp_meta {
        Some(meta) => {
            let ident = ident_from_tag(&meta.tag);
            format!(
                "// {src_path}\nexport const {ident} = {{ tag: '{tag}' }};\nregisterComponent('{tag}', {ident});\n",
                tag = meta.tag,
            )
        }
        None => source.to_string(),
    };

    TranspileOutput { js_text, cmp_meta }
}

/// Extracts `@Component({ tag, styleUrl?, styles? })` metadata.
///
/// The decorator arguments are found by balanced-paren scanning that is
/// aware of string literals, so styles containing parens or quotes do
/// not break extraction. A decorator without a `tag` is not a
/// component.
pub fn extract_component_meta(source: &str) -> Option<ComponentMeta> {
    let start = source.find("@Component")? + "@Component".len();
    let rest = &source[start..];

    let open = rest.find(|c: char| !c.is_whitespace())?;
    if !rest[open..].starts_with('(') {
        return None;
    }

    let args = balanced_block(&rest[open..])?;
    let tag = extract_string_prop(args, "tag")?;

    Some(ComponentMeta {
        tag,
        style_url: extract_string_prop(args, "styleUrl"),
        styles: extract_string_prop(args, "styles"),
    })
}

/// Returns the text between the outer parens of `s`, which must start
/// at an opening paren.
fn balanced_block(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => in_string = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[1..i]);
                }
            }
            _ => {}
        }
    }

    None
}

fn extract_string_prop(args: &str, name: &str) -> Option<String> {
    let mut search = 0;
    while let Some(rel) = args[search..].find(name) {
        let idx = search + rel;
        let boundary_before = idx == 0 || {
            let b = args.as_bytes()[idx - 1];
            !b.is_ascii_alphanumeric() && b != b'_'
        };
        let after = args[idx + name.len()..].trim_start();

        if boundary_before && after.starts_with(':') {
            return parse_string_literal(after[1..].trim_start());
        }
        search = idx + name.len();
    }
    None
}

fn parse_string_literal(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let quote = chars.next()?;
    if !matches!(quote, '\'' | '"' | '`') {
        return None;
    }

    let mut out = String::new();
    let mut escaped = false;
    for c in chars {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(out);
        } else {
            out.push(c);
        }
    }
    None
}

/// `my-card` -> `MyCard`.
fn ident_from_tag(tag: &str) -> String {
    tag.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
