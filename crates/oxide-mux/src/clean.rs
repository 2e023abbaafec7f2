//! Lexical path canonicalization.

/// Returns the canonical form of a request path.
///
/// - an empty path becomes `/`
/// - a missing leading `/` is added
/// - empty and `.` segments are dropped, `..` removes the previous segment
/// - a trailing `/` on the input is kept, except that the root stays `/`
///
/// The rewrite is purely lexical; nothing touches the filesystem.
///
/// ```
/// use oxide_mux::clean_path;
///
/// assert_eq!(clean_path("/abc/../blob"), "/blob");
/// assert_eq!(clean_path("a//b/./c/"), "/a/b/c/");
/// assert_eq!(clean_path("/../.."), "/");
/// ```
#[must_use]
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }

    if cleaned.is_empty() || path.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}
