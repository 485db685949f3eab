use std::time::SystemTime;

/// Name announced in the `Server` header.
pub const SERVER_NAME: &str = "spysrv";

/// An HTTP status code.
///
/// # Example
///
/// ```
/// # use spysrv::http::response::StatusCode;
/// assert_eq!(StatusCode::OK.as_u16(), 200);
/// assert_eq!(StatusCode::METHOD_NOT_ALLOWED.reason_phrase(), "Method Not Allowed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the reason phrase sent on the status line. Codes outside the
    /// table get `GOK`.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            207 => "Partial Update OK",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Moved Temporarily",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Request Entity Too Large",
            414 => "Request-URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Requested range not satisfiable",
            417 => "Expectation Failed",
            418 => "Reauthentication Required",
            419 => "Proxy Reauthentication Required",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Partial Update Not Implemented",
            _ => "GOK",
        }
    }
}

/// Status line and headers of a response, in the order they are sent.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Creates a head carrying the headers every reply of this server has:
    /// `Connection`, `Server`, `X-Srv-Connection` and `Date`.
    pub fn new(status: StatusCode, label: &str) -> Self {
        Self::at(status, label, SystemTime::now())
    }

    pub fn at(status: StatusCode, label: &str, now: SystemTime) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
        .header("Connection", "close")
        .header("Server", SERVER_NAME)
        .header("X-Srv-Connection", label)
        .header("Date", httpdate::fmt_http_date(now))
    }

    /// Appends a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Value of the first header named `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
