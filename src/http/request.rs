/// HTTP request methods.
///
/// Only `GET` is served. Every other method is still recognized so it can
/// be logged, and earns a 405 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    Get,
    /// HEAD - Like GET but without the response body
    Head,
    /// POST - Create or submit data
    Post,
    /// PUT - Replace a resource
    Put,
    /// DELETE - Delete a resource
    Delete,
    /// OPTIONS - Describe communication options
    Options,
    /// PATCH - Partial modification of a resource
    Patch,
    /// Anything else, kept verbatim
    Extension(String),
}

impl Method {
    /// Parses an HTTP method token. Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use spysrv::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::Get);
    /// assert_eq!(Method::parse("get"), Method::Extension("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => Method::Extension(other.to_string()),
        }
    }
}

/// The three tokens of a request line.
///
/// Tokens are separated by single spaces or tabs, so a run of separators
/// yields empty tokens. Missing tokens are empty and anything past the third
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split([' ', '\t']).map(str::to_string);

        Self {
            method: tokens.next().unwrap_or_default(),
            target: tokens.next().unwrap_or_default(),
            version: tokens.next().unwrap_or_default(),
        }
    }

    pub fn method(&self) -> Method {
        Method::parse(&self.method)
    }
}

const ROOT_PATH: &str = "/";

/// Extracts the file path from a request target.
///
/// An `http://` (or `HTTP://`) scheme and authority are skipped, the query
/// string is cut off, and a target without a path maps to `/`. The path is
/// neither percent-decoded nor normalized.
///
/// ```
/// # use spysrv::http::request::extract_path;
/// assert_eq!(extract_path(Some("/foo/bar?x=1")), "/foo/bar");
/// assert_eq!(extract_path(Some("http://host/foo")), "/foo");
/// assert_eq!(extract_path(Some("*")), "/");
/// assert_eq!(extract_path(None), "/");
/// ```
pub fn extract_path(target: Option<&str>) -> &str {
    let Some(target) = target else {
        return ROOT_PATH;
    };
    let target = target
        .strip_prefix("http://")
        .or_else(|| target.strip_prefix("HTTP://"))
        .unwrap_or(target);

    match target.find(['/', '?']) {
        Some(start) if target.as_bytes()[start] == b'/' => {
            let path = &target[start..];
            match path.find('?') {
                Some(end) => &path[..end],
                None => path,
            }
        }
        _ => ROOT_PATH,
    }
}
