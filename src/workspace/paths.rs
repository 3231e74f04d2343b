//! Slash-separated project path arithmetic.

/// Split a project path into its non-empty segments.
#[must_use]
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Relative path from directory `from_dir` to `to`.
///
/// Both arguments are project paths; the root directory is `""`.
#[must_use]
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let from = segments(from_dir);
    let to = segments(to);
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(from.len() - common));
    parts.extend(&to[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Join a relative path onto a directory, normalising `.` and `..`.
///
/// Returns `None` when the path escapes the project root.
#[must_use]
pub fn join(dir: &str, relative: &str) -> Option<String> {
    let mut stack: Vec<&str> = segments(dir);
    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop()?;
            }
            name => stack.push(name),
        }
    }
    Some(stack.join("/"))
}

/// Parent directory of a project path (`""` for top-level entries).
#[must_use]
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Dotted module name of a file path (`a/b/Foo.txt` → `a.b.Foo`).
#[must_use]
pub fn module_name(path: &str) -> String {
    let parts = segments(path);
    let mut out: Vec<&str> = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if i + 1 == parts.len() {
            out.push(part.rsplit_once('.').map_or(*part, |(stem, _)| stem));
        } else {
            out.push(part);
        }
    }
    out.join(".")
}
