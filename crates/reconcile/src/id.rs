//! Hierarchical node ids
//!
//! Ids are dot-segmented (`array.disks.0.name`). Every dot prefix of an id
//! names an ancestor container node.

/// Segment separator inside node ids.
pub const SEPARATOR: char = '.';

/// Placeholder segment for resources whose identity is empty.
pub const UNKNOWN_SEGMENT: &str = "unknown";

/// Make a runtime-discovered resource name safe for use as one id segment.
///
/// Strips one leading `/`, then replaces every character outside
/// `[A-Za-z0-9_-]` with `_`. Empty input maps to `unknown`.
pub fn sanitize_resource_name(raw: &str) -> String {
    let stripped = raw.strip_prefix('/').unwrap_or(raw);
    if stripped.is_empty() {
        return UNKNOWN_SEGMENT.to_string();
    }
    stripped
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Join a base id and one more segment.
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}{SEPARATOR}{segment}")
    }
}

/// Every dot prefix of `id`, shortest first, including `id` itself.
///
/// `prefixes("a.b.c")` yields `a`, `a.b`, `a.b.c`.
pub fn prefixes(id: &str) -> impl Iterator<Item = &str> {
    id.match_indices(SEPARATOR)
        .map(move |(pos, _)| &id[..pos])
        .chain(std::iter::once(id))
        .filter(|p| !p.is_empty())
}

/// Strict ancestors of `id`, shortest first.
pub fn ancestors(id: &str) -> impl Iterator<Item = &str> {
    id.match_indices(SEPARATOR).map(move |(pos, _)| &id[..pos])
}

/// Parent id, or `None` for a root id.
pub fn parent(id: &str) -> Option<&str> {
    id.rfind(SEPARATOR).map(|pos| &id[..pos])
}

/// Last segment of an id.
pub fn last_segment(id: &str) -> &str {
    id.rfind(SEPARATOR).map_or(id, |pos| &id[pos + 1..])
}

/// Number of segments in an id.
pub fn depth(id: &str) -> usize {
    if id.is_empty() {
        0
    } else {
        id.matches(SEPARATOR).count() + 1
    }
}

/// Whether `id` equals `root` or lies somewhere below it.
///
/// Segment-aware: `array.disks` is not within `array.dis`.
pub fn is_within(id: &str, root: &str) -> bool {
    match id.strip_prefix(root) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Whether `id` lies strictly below `root`.
pub fn is_strictly_within(id: &str, root: &str) -> bool {
    id.len() > root.len() && is_within(id, root)
}

/// The first segment of `id` below `root`, if `id` lies strictly below it.
///
/// `child_segment("docker.containers.nginx.state", "docker.containers")` is `nginx`.
pub fn child_segment<'a>(id: &'a str, root: &str) -> Option<&'a str> {
    if !is_strictly_within(id, root) {
        return None;
    }
    let rest = &id[root.len() + 1..];
    rest.split(SEPARATOR).next()
}

/// Whether an id is well formed (non-empty, no empty segments).
pub fn is_valid(id: &str) -> bool {
    !id.is_empty() && id.split(SEPARATOR).all(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_resource_name() {
        assert_eq!(sanitize_resource_name("/my-container"), "my-container");
        assert_eq!(sanitize_resource_name("a b!c"), "a_b_c");
        assert_eq!(sanitize_resource_name(""), "unknown");
        assert_eq!(sanitize_resource_name("/"), "unknown");
        assert_eq!(sanitize_resource_name("//double"), "_double");
        assert_eq!(sanitize_resource_name("plex.media"), "plex_media");
        assert_eq!(sanitize_resource_name("Ünïcode"), "_n_code");
    }

    #[test]
    fn test_prefixes() {
        let all: Vec<_> = prefixes("array.disks.0.name").collect();
        assert_eq!(all, vec!["array", "array.disks", "array.disks.0", "array.disks.0.name"]);
        assert_eq!(prefixes("info").collect::<Vec<_>>(), vec!["info"]);
    }

    #[test]
    fn test_ancestors_exclude_self() {
        let all: Vec<_> = ancestors("metrics.cpu.percentTotal").collect();
        assert_eq!(all, vec!["metrics", "metrics.cpu"]);
        assert_eq!(ancestors("info").count(), 0);
    }

    #[test]
    fn test_parent_and_last_segment() {
        assert_eq!(parent("array.disks.0"), Some("array.disks"));
        assert_eq!(parent("array"), None);
        assert_eq!(last_segment("array.disks.0"), "0");
        assert_eq!(last_segment("array"), "array");
        assert_eq!(depth("array.disks.0"), 3);
        assert_eq!(depth(""), 0);
    }

    #[test]
    fn test_is_within_is_segment_aware() {
        assert!(is_within("array.disks.0", "array.disks"));
        assert!(is_within("array.disks", "array.disks"));
        assert!(!is_within("array.disksx", "array.disks"));
        assert!(!is_within("array", "array.disks"));
        assert!(!is_strictly_within("array.disks", "array.disks"));
        assert!(is_strictly_within("array.disks.1", "array.disks"));
    }

    #[test]
    fn test_child_segment() {
        assert_eq!(
            child_segment("docker.containers.nginx.state", "docker.containers"),
            Some("nginx")
        );
        assert_eq!(child_segment("docker.containers", "docker.containers"), None);
        assert_eq!(child_segment("vms.list.x", "docker.containers"), None);
    }

    #[test]
    fn test_join_and_validity() {
        assert_eq!(join("shares", "appdata"), "shares.appdata");
        assert_eq!(join("", "info"), "info");
        assert!(is_valid("a.b"));
        assert!(!is_valid("a..b"));
        assert!(!is_valid(""));
        assert!(!is_valid(".a"));
    }
}
