/// Join two path segments so that exactly one `/` separates them.
///
/// An empty suffix leaves the base untouched.
pub fn single_joining_slash(a: &str, b: &str) -> String {
    if b.is_empty() {
        return a.to_string();
    }
    let a_slash = a.ends_with('/');
    let b_slash = b.starts_with('/');
    match (a_slash, b_slash) {
        (true, true) => format!("{a}{}", &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}

/// Join an upstream base path onto a request path.
///
/// Each side is given as its plain path and its escaped form; the escaped form is
/// empty when it carries nothing the plain path doesn't. Returns the joined plain
/// path and the joined escaped path, the latter empty when neither input had one.
pub fn join_url_path(base_path: &str, base_raw_path: &str, req_path: &str, req_raw_path: &str) -> (String, String) {
    if base_raw_path.is_empty() && req_raw_path.is_empty() {
        return (single_joining_slash(base_path, req_path), String::new());
    }

    // The slash decision is taken on the escaped forms and mirrored on the plain paths.
    let base_escaped = escaped_or_plain(base_path, base_raw_path);
    let req_escaped = escaped_or_plain(req_path, req_raw_path);
    if req_escaped.is_empty() {
        return (base_path.to_string(), base_escaped.to_string());
    }

    let a_slash = base_escaped.ends_with('/');
    let b_slash = req_escaped.starts_with('/');
    match (a_slash, b_slash) {
        (true, true) => (
            format!("{base_path}{}", req_path.strip_prefix('/').unwrap_or(req_path)),
            format!("{base_escaped}{}", &req_escaped[1..]),
        ),
        (false, false) => (format!("{base_path}/{req_path}"), format!("{base_escaped}/{req_escaped}")),
        _ => (format!("{base_path}{req_path}"), format!("{base_escaped}{req_escaped}")),
    }
}

/// Split an escaped URI path into its plain form and its raw form.
///
/// The raw form is only kept when the path carries percent escapes; otherwise the
/// plain path already is the escaped path and the raw form is empty.
pub fn split_escaped(escaped: &str) -> (String, String) {
    if !escaped.contains('%') {
        return (escaped.to_string(), String::new());
    }
    let plain = match urlencoding::decode(escaped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => escaped.to_string(),
    };
    (plain, escaped.to_string())
}

fn escaped_or_plain<'a>(plain: &'a str, raw: &'a str) -> &'a str {
    if raw.is_empty() { plain } else { raw }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_joining_slash_both_slashes() {
        assert_eq!(single_joining_slash("/a/", "/b"), "/a/b");
    }

    #[test]
    fn test_single_joining_slash_no_slashes() {
        assert_eq!(single_joining_slash("/a", "b"), "/a/b");
    }

    #[test]
    fn test_single_joining_slash_one_slash() {
        assert_eq!(single_joining_slash("/a", "/b"), "/a/b");
        assert_eq!(single_joining_slash("/a/", "b"), "/a/b");
        assert_eq!(single_joining_slash("", "/b"), "/b");
        assert_eq!(single_joining_slash("/", "/"), "/");
    }

    #[test]
    fn test_single_joining_slash_empty_suffix_is_neutral() {
        for base in ["", "/", "/a", "/a/", "/a/b/c"] {
            assert_eq!(single_joining_slash(base, ""), base);
            let once = single_joining_slash(base, "");
            assert_eq!(single_joining_slash(&once, ""), once);
        }
    }

    #[test]
    fn test_join_url_path_without_escapes() {
        assert_eq!(join_url_path("/base", "", "/p", ""), ("/base/p".to_string(), String::new()));
        assert_eq!(join_url_path("/base/", "", "/p", ""), ("/base/p".to_string(), String::new()));
        assert_eq!(join_url_path("/", "", "/v2/", ""), ("/v2/".to_string(), String::new()));
    }

    #[test]
    fn test_join_url_path_with_escaped_request() {
        let (path, raw) = join_url_path("/base", "", "/a b", "/a%20b");
        assert_eq!(path, "/base/a b");
        assert_eq!(raw, "/base/a%20b");
    }

    #[test]
    fn test_join_url_path_with_escaped_base() {
        let (path, raw) = join_url_path("/x/y/", "/x%2Fy/", "/p", "");
        assert_eq!(path, "/x/y/p");
        assert_eq!(raw, "/x%2Fy/p");
    }

    #[test]
    fn test_join_url_path_never_doubles_slash() {
        let (path, raw) = join_url_path("/a/", "/a%41/", "/b%2F", "/b%2F");
        assert!(!path.contains("//"));
        assert!(!raw.contains("//"));
    }

    #[test]
    fn test_split_escaped() {
        assert_eq!(split_escaped("/v2/library"), ("/v2/library".to_string(), String::new()));
        assert_eq!(split_escaped("/a%20b"), ("/a b".to_string(), "/a%20b".to_string()));
    }
}
