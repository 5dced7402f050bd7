//! Style rendering for each bundle's components.

use rayon::prelude::*;

use strata_common::paths::{dirname, join};
use strata_common::StrataResult;
use strata_config::ResolvedConfig;
use strata_diagnostics::{catch_error, DiagnosticSink};

use crate::build_ctx::BuildCtx;
use crate::bundle::Bundle;
use crate::ctx::CompilerCtx;
use crate::plugin::{Plugin, PluginHost};

struct StyleJob {
    bundle_idx: usize,
    tag: String,
    style_path: String,
}

/// Renders the styles for every bundle.
///
/// Inline `styles` are used verbatim. A `styleUrl` is resolved relative
/// to the component source, read through the virtual filesystem, and
/// run through the plugin transform chain; external styles render in
/// parallel, with their diagnostics funneled through a sink. Rendered
/// output is cached under the `style` domain, keyed on the minify
/// setting plus the raw source. `style_build_count` counts only actual
/// renders, not cache hits.
pub fn generate_styles(
    config: &ResolvedConfig,
    ctx: &CompilerCtx,
    build_ctx: &mut BuildCtx,
    bundles: &mut [Bundle],
    plugins: &[Box<dyn Plugin>],
) -> StrataResult<()> {
    let files_changed = build_ctx.files_changed().to_vec();
    let host = PluginHost {
        plugins,
        fs: &ctx.fs,
        cache: &ctx.cache,
        config,
        files_changed: &files_changed,
    };

    let mut jobs: Vec<StyleJob> = Vec::new();
    for (bundle_idx, bundle) in bundles.iter_mut().enumerate() {
        let Bundle {
            module_files,
            styles,
            ..
        } = bundle;

        for module in module_files.iter() {
            let Some(meta) = &module.cmp_meta else {
                continue;
            };

            if let Some(inline) = &meta.styles {
                styles.insert(meta.tag.clone(), inline.clone());
            } else if let Some(style_url) = &meta.style_url {
                jobs.push(StyleJob {
                    bundle_idx,
                    tag: meta.tag.clone(),
                    style_path: join(&dirname(&module.src_path), style_url),
                });
            }
        }
    }

    let sink = DiagnosticSink::new();
    let rendered: Vec<(Option<String>, bool)> = jobs
        .par_iter()
        .map(|job| render_style(config, ctx, &host, &sink, &job.style_path))
        .collect();

    for (job, (css, was_rendered)) in jobs.iter().zip(rendered) {
        if was_rendered {
            build_ctx.style_build_count += 1;
        }
        if let Some(css) = css {
            bundles[job.bundle_idx].styles.insert(job.tag.clone(), css);
        }
    }

    build_ctx.diagnostics.extend(sink.take_all());
    Ok(())
}

/// Renders one external stylesheet. Returns the css (when anything
/// usable came out) and whether an actual render happened, as opposed
/// to a cache hit.
fn render_style(
    config: &ResolvedConfig,
    ctx: &CompilerCtx,
    host: &PluginHost<'_>,
    sink: &DiagnosticSink,
    style_path: &str,
) -> (Option<String>, bool) {
    let mut local = Vec::new();

    let raw = match ctx.fs.read_file(style_path) {
        Ok(raw) => raw,
        Err(err) => {
            catch_error(&mut local, "style", err);
            drain_into(sink, local);
            return (None, false);
        }
    };

    let key = ctx
        .cache
        .create_key("style", &format!("{}:{raw}", config.minify_css));
    if let Some(hit) = ctx.cache.get(&key) {
        return (Some(hit), false);
    }

    match host.run_transforms(&mut local, style_path) {
        Ok(output) => {
            ctx.cache.put(&key, &output.code);
            drain_into(sink, local);
            (Some(output.code), true)
        }
        Err(err) => {
            catch_error(&mut local, "style", err);
            drain_into(sink, local);
            (None, false)
        }
    }
}

fn drain_into(sink: &DiagnosticSink, diagnostics: Vec<strata_diagnostics::Diagnostic>) {
    for diagnostic in diagnostics {
        sink.emit(diagnostic);
    }
}
