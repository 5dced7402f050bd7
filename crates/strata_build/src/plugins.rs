//! Built-in style plugins and the raw loader fallback.

use strata_common::StrataResult;
use strata_fs::FsError;

use crate::plugin::{Plugin, PluginOpts, TransformResults};
use crate::reconcile::{is_css_file, is_sass_file};

/// The default plugin set, in registration order: Sass passthrough
/// rendering, CSS minification, and a raw file loader as the fallback.
pub fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(SassPlugin),
        Box::new(CssMinifyPlugin),
        Box::new(RawLoaderPlugin),
    ]
}

/// Renders `.scss`/`.sass` sources.
///
/// Rendering is passthrough (plain CSS subset), but the id is rewritten
/// to `.css` so downstream plugins and the registry treat the output as
/// rendered CSS, and the rendered file is staged in memory for anything
/// that resolves the css path later.
pub struct SassPlugin;

impl Plugin for SassPlugin {
    fn name(&self) -> &str {
        "SassPlugin"
    }

    fn transform(&self, opts: &PluginOpts<'_>) -> Option<StrataResult<TransformResults>> {
        if !is_sass_file(opts.id) {
            return None;
        }

        let css_id = rewrite_extension(opts.id, "css");
        opts.fs.write_file_in_memory(&css_id, opts.code);

        Some(Ok(TransformResults {
            code: Some(opts.code.to_string()),
            id: Some(css_id),
        }))
    }
}

/// Minifies CSS when `minify_css` is enabled, whitespace-level only.
/// Minified output is cached under the `minifycss` domain.
pub struct CssMinifyPlugin;

impl Plugin for CssMinifyPlugin {
    fn name(&self) -> &str {
        "CssMinifyPlugin"
    }

    fn transform(&self, opts: &PluginOpts<'_>) -> Option<StrataResult<TransformResults>> {
        if !opts.config.minify_css || !is_css_file(opts.id) {
            return None;
        }

        let key = opts.cache.create_key("minifycss", opts.code);
        let code = match opts.cache.get(&key) {
            Some(hit) => hit,
            None => {
                let minified = minify_css(opts.code);
                opts.cache.put(&key, &minified);
                minified
            }
        };

        Some(Ok(TransformResults {
            code: Some(code),
            id: None,
        }))
    }
}

/// Fallback loader: reads the id from the virtual filesystem.
pub struct RawLoaderPlugin;

impl Plugin for RawLoaderPlugin {
    fn name(&self) -> &str {
        "RawLoaderPlugin"
    }

    fn load(&self, opts: &PluginOpts<'_>) -> Option<StrataResult<String>> {
        Some(
            opts.fs
                .read_file(opts.id)
                .map_err(|err: FsError| err.to_string().into()),
        )
    }
}

fn rewrite_extension(id: &str, new_ext: &str) -> String {
    match id.rfind('.') {
        Some(idx) => format!("{}.{new_ext}", &id[..idx]),
        None => format!("{id}.{new_ext}"),
    }
}

/// Whitespace-level CSS minification: collapses runs of whitespace and
/// drops the spaces around punctuation. Content inside quoted strings
/// is preserved.
pub fn minify_css(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    let mut in_string: Option<char> = None;
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            out.push(c);
            if c == quote {
                in_string = None;
            } else if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                if pending_space && needs_space(out.chars().last(), Some(c)) {
                    out.push(' ');
                }
                pending_space = false;
                in_string = Some(c);
                out.push(c);
            }
            c if c.is_whitespace() => {
                pending_space = true;
            }
            '{' | '}' | ';' | ':' | ',' | '>' => {
                pending_space = false;
                out.push(c);
            }
            _ => {
                if pending_space && needs_space(out.chars().last(), Some(c)) {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    out.trim().to_string()
}

fn needs_space(prev: Option<char>, _next: Option<char>) -> bool {
    !matches!(prev, None | Some('{' | '}' | ';' | ':' | ',' | '>'))
}
