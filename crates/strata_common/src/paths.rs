//! The normalized path model used throughout the build pipeline.
//!
//! Every path stored in the virtual filesystem is an absolute,
//! forward-slash, trailing-slash-free string. Normalizing once at the
//! boundary keeps cache lookups consistent across platforms and lets the
//! commit planner reason about paths with plain string operations.

/// Normalizes a path to forward slashes with no trailing slash.
///
/// Windows backslash paths become slash paths (`foo\bar` -> `foo/bar`).
/// A trailing slash is removed except on filesystem roots (`/`, `C:/`).
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");

    while p.len() > 1 && p.ends_with('/') && !is_root(&p) {
        p.pop();
    }

    p
}

/// Returns `true` for filesystem roots: `/` and drive roots like `C:/`.
pub fn is_root(path: &str) -> bool {
    path == "/" || path.ends_with(":/")
}

/// Returns the parent directory of a normalized path.
///
/// The parent of a top-level entry is the root itself: `dirname("/a")`
/// is `"/"` and `dirname("C:/a")` is `"C:/"`.
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => {
            let parent = &path[..idx];
            if parent.ends_with(':') {
                format!("{parent}/")
            } else {
                parent.to_string()
            }
        }
        None => path.to_string(),
    }
}

/// Returns the final path component.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the final path component with its last extension removed.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Returns the lowercase extension of a path, or an empty string.
pub fn extension(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Joins two path fragments and normalizes the result.
pub fn join(base: &str, rest: &str) -> String {
    let base = normalize_path(base);
    let rest = rest.trim_matches('/');
    if rest.is_empty() {
        return base;
    }
    if base.ends_with('/') {
        normalize_path(&format!("{base}{rest}"))
    } else {
        normalize_path(&format!("{base}/{rest}"))
    }
}

/// Returns the number of slash-separated segments in a path.
///
/// Used only for ordering: the commit planner creates shallow directories
/// first and deletes deep directories first.
pub fn depth(path: &str) -> usize {
    path.split('/').count()
}

/// Returns every ancestor directory of a path, shallowest first,
/// excluding the root and the path itself.
///
/// `ancestors("/a/b/c")` yields `["/a", "/a/b"]`.
pub fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').collect();
    let mut out = Vec::new();
    for j in 2..segments.len() {
        out.push(segments[..j].join("/"));
    }
    out
}

/// Returns `true` if `path` is `dir` itself or lies anywhere beneath it.
pub fn is_under(dir: &str, path: &str) -> bool {
    if path == dir {
        return true;
    }
    if is_root(dir) {
        return path.starts_with(dir);
    }
    path.starts_with(dir) && path.as_bytes().get(dir.len()) == Some(&b'/')
}

/// Returns `path` relative to `base`, or `None` if it is not beneath it.
pub fn rel_from(base: &str, path: &str) -> Option<String> {
    if !is_under(base, path) || path == base {
        return None;
    }
    if is_root(base) {
        Some(path[base.len()..].to_string())
    } else {
        Some(path[base.len() + 1..].to_string())
    }
}
