use crate::http::headers::Headers;

/// HTTP status codes known to the server.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request
/// - `Unauthorized` (401): Authentication required
/// - `Forbidden` (403): Access denied
/// - `NotFound` (404): Resource not found
/// - `InternalServerError` (500): Server error
///
/// `Unauthorized` and `Forbidden` carry no reason phrase, so a
/// [`ResponseWriter`](crate::http::writer::ResponseWriter) refuses to put
/// them on a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            400 => Some(StatusCode::BadRequest),
            401 => Some(StatusCode::Unauthorized),
            403 => Some(StatusCode::Forbidden),
            404 => Some(StatusCode::NotFound),
            500 => Some(StatusCode::InternalServerError),
            _ => None,
        }
    }

    /// Returns the reason phrase written on the status line, if there is one.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), Some("OK"));
    /// assert_eq!(StatusCode::Forbidden.reason_phrase(), None);
    /// ```
    pub fn reason_phrase(&self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => Some("OK"),
            StatusCode::BadRequest => Some("Bad Request"),
            StatusCode::NotFound => Some("Not Found"),
            StatusCode::InternalServerError => Some("Internal Server Error"),
            StatusCode::Unauthorized | StatusCode::Forbidden => None,
        }
    }
}

/// Headers every plain response starts from.
///
/// Callers override or delete entries before handing them to
/// [`ResponseWriter::write_headers`](crate::http::writer::ResponseWriter::write_headers).
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", &content_len.to_string());
    headers.set("Connection", "Close");
    headers.set("Content-Type", "text/plain");
    headers
}
