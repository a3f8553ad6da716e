use crate::connection::Connection;
use crate::http_url;
use crate::response::Response;
use crate::Error;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::io;

/// An HTTP request method.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Method {
    /// The GET method
    Get,
    /// The HEAD method
    Head,
    /// The POST method
    Post,
    /// The PUT method
    Put,
    /// The DELETE method
    Delete,
    /// The CONNECT method
    Connect,
    /// The OPTIONS method
    Options,
    /// The TRACE method
    Trace,
    /// The PATCH method
    Patch,
    /// A custom method, use with care: the string will be embedded in
    /// your request as-is.
    Custom(String),
}

impl fmt::Display for Method {
    /// Formats the Method to the form in the HTTP request,
    /// ie. Method::Get -> "GET", Method::Post -> "POST", etc.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
            Method::Connect => write!(f, "CONNECT"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Trace => write!(f, "TRACE"),
            Method::Patch => write!(f, "PATCH"),
            Method::Custom(ref s) => write!(f, "{}", s),
        }
    }
}

/// The protocol to send the request over.
///
/// Selects between plain-TCP HTTP and TLS-secured HTTPS. The latter requires
/// one of the `https` features; without it, sending fails with
/// [`HttpsFeatureNotEnabled`](enum.Error.html#variant.HttpsFeatureNotEnabled).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transport {
    /// Plain HTTP over TCP, port 80 unless overridden.
    Http,
    /// HTTP over TLS, port 443 unless overridden.
    Https,
}

impl Transport {
    /// Parses a protocol selector string: `"https"` selects
    /// [`Https`](#variant.Https), anything else selects
    /// [`Http`](#variant.Http).
    pub fn from_selector(selector: &str) -> Transport {
        if selector == "https" {
            Transport::Https
        } else {
            Transport::Http
        }
    }
}

impl Default for Transport {
    /// Plain HTTP: the transport used when no selector is given.
    fn default() -> Transport {
        Transport::Http
    }
}

/// Username and password for the `authorization` header.
///
/// Turned into `Basic <base64(username:password)>` before the request is
/// sent. The credentials are not validated: a colon inside the username
/// makes them ambiguous to the receiving server, but is not rejected here.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BasicAuth {
    /// The username.
    pub username: String,
    /// The password.
    pub password: String,
}

/// The encoding the response body text is decoded with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResponseEncoding {
    /// Strict UTF-8, the default. Bodies with invalid UTF-8 fail with
    /// [`InvalidUtf8InBody`](enum.Error.html#variant.InvalidUtf8InBody).
    Utf8,
    /// ISO 8859-1: every byte is mapped to the corresponding code point,
    /// so decoding never fails.
    Latin1,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum Port {
    ImplicitHttp,
    ImplicitHttps,
    Explicit(u32),
}

impl Port {
    pub(crate) fn port(self) -> u32 {
        match self {
            Port::ImplicitHttp => 80,
            Port::ImplicitHttps => 443,
            Port::Explicit(port) => port,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
enum RequestBody {
    Text(String),
    Json(serde_json::Value),
}

/// Where and what to ask for: the host, port, path, method and headers of
/// one request. The headers map starts out absent and is created the first
/// time a header is written.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Target {
    pub(crate) host: String,
    pub(crate) port: Port,
    pub(crate) path: String,
    pub(crate) method: Method,
    pub(crate) headers: Option<HashMap<String, String>>,
}

/// All the options of one HTTP(S) request.
///
/// Built with [`new`](#method.new) and the `with_*` methods, and consumed by
/// [`send`](#method.send), which runs the whole pipeline and resolves into a
/// [`Response`](struct.Response.html).
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), onereq::Error> {
/// let response = onereq::RequestOptions::new(onereq::Transport::Http, "example.com", "/")
///     .with_header("accept", "text/html")
///     .send()?;
/// # Ok(()) }
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct RequestOptions {
    pub(crate) transport: Transport,
    pub(crate) target: Target,
    body: Option<RequestBody>,
    basic_auth: Option<BasicAuth>,
    follow_redirects: bool,
    response_encoding: ResponseEncoding,
    pub(crate) timeout: Option<u64>,
    max_redirects: usize,
}

impl RequestOptions {
    /// Creates a new set of request options: a GET request for `path` on
    /// `host`, over the given transport, with no timeout, no headers, no
    /// body, and redirect following disabled.
    pub fn new<T: Into<String>, U: Into<String>>(
        transport: Transport,
        host: T,
        path: U,
    ) -> RequestOptions {
        RequestOptions {
            transport,
            target: Target {
                host: host.into(),
                port: match transport {
                    Transport::Http => Port::ImplicitHttp,
                    Transport::Https => Port::ImplicitHttps,
                },
                path: path.into(),
                method: Method::Get,
                headers: None,
            },
            body: None,
            basic_auth: None,
            follow_redirects: false,
            response_encoding: ResponseEncoding::Utf8,
            timeout: None,
            max_redirects: 100,
        }
    }

    /// Sets the request method. GET by default.
    pub fn with_method(mut self, method: Method) -> RequestOptions {
        self.target.method = method;
        self
    }

    /// Sets an explicit port to connect to, instead of the transport's
    /// default (80 for HTTP, 443 for HTTPS).
    pub fn with_port(mut self, port: u32) -> RequestOptions {
        self.target.port = Port::Explicit(port);
        self
    }

    /// Adds a header to the request this is called on, creating the headers
    /// map if this is the first one.
    pub fn with_header<T: Into<String>, U: Into<String>>(mut self, key: T, value: U) -> RequestOptions {
        let headers = self.target.headers.get_or_insert_with(HashMap::new);
        headers.insert(key.into(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body<T: Into<String>>(mut self, body: T) -> RequestOptions {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Sets the given value as a structured request body. Before the request
    /// is sent, the value is serialized into JSON text and a
    /// `content-type: application/json` header is set.
    ///
    /// # Errors
    ///
    /// Returns [`Serialization`](enum.Error.html#variant.Serialization) if
    /// Serde runs into a problem when converting `body` into a JSON value.
    pub fn with_json<T: serde::ser::Serialize>(mut self, body: &T) -> Result<RequestOptions, Error> {
        match serde_json::to_value(body) {
            Ok(value) => {
                self.body = Some(RequestBody::Json(value));
                Ok(self)
            }
            Err(err) => Err(Error::Serialization(err)),
        }
    }

    /// Sets the username and password the `authorization` header is
    /// computed from, overwriting any previously set `authorization`.
    pub fn with_basic_auth<T: Into<String>, U: Into<String>>(
        mut self,
        username: T,
        password: U,
    ) -> RequestOptions {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets whether 301 and 302 responses with a `location` header are
    /// followed. Disabled by default.
    ///
    /// Only the path of the `location` URL is used for the next hop: the
    /// host, port and protocol of the original request are kept even when
    /// the location points at another origin, so cross-origin redirects
    /// silently keep requesting the original host.
    pub fn with_follow_redirects(mut self, follow_redirects: bool) -> RequestOptions {
        self.follow_redirects = follow_redirects;
        self
    }

    /// Sets the encoding the response body is decoded with.
    /// [`Utf8`](enum.ResponseEncoding.html#variant.Utf8) by default.
    pub fn with_response_encoding(mut self, encoding: ResponseEncoding) -> RequestOptions {
        self.response_encoding = encoding;
        self
    }

    /// Sets the request timeout in seconds. The timeout is passed through
    /// to the transport and applies to each network round-trip, so every
    /// followed redirect hop gets a fresh deadline.
    ///
    /// NOTE: There is no timeout by default.
    pub fn with_timeout(mut self, timeout: u64) -> RequestOptions {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the max redirects we follow until giving up. 100 by default.
    pub fn with_max_redirects(mut self, max_redirects: usize) -> RequestOptions {
        self.max_redirects = max_redirects;
        self
    }

    /// Sends this request to the host.
    ///
    /// This runs the whole pipeline: the derived headers are filled in, the
    /// request is issued over the selected transport, redirects are followed
    /// if enabled, and the terminal response's body is decoded according to
    /// its content type.
    ///
    /// # Errors
    ///
    /// Returns `Err` if we run into an error while sending the request, or
    /// receiving/decoding the response. The specific error is described in
    /// the `Err`, see [`Error`](enum.Error.html). Failures are not retried.
    pub fn send(mut self) -> Result<Response, Error> {
        self.normalize()?;

        let is_head = self.target.method == Method::Head;
        let mut hops = 0;
        loop {
            let mut stream = match self.transport {
                Transport::Https => {
                    #[cfg(feature = "rustls")]
                    {
                        Connection::new(&self).send_https()?
                    }
                    #[cfg(not(feature = "rustls"))]
                    {
                        return Err(Error::HttpsFeatureNotEnabled);
                    }
                }
                Transport::Http => Connection::new(&self).send()?,
            };

            if let Some(path) = self.redirect_path(stream.status_code, &stream.headers) {
                if hops >= self.max_redirects {
                    return Err(Error::TooManyRedirects);
                }
                hops += 1;
                // Each hop's body is read to completion before the next
                // request goes out.
                if !is_head && stream.status_code != 204 && stream.status_code != 304 {
                    io::copy(&mut stream, &mut io::sink())?;
                }
                self.target.path = path;
                continue;
            }

            return Response::create(stream, is_head, self.response_encoding);
        }
    }

    /// Fills in the parts of the request that are derived from other
    /// options: the headers map is created if absent, a structured body is
    /// serialized into JSON text with a matching `content-type` header, and
    /// the basic-auth credentials are turned into an `authorization` header.
    fn normalize(&mut self) -> Result<(), Error> {
        let headers = self.target.headers.get_or_insert_with(HashMap::new);

        let serialized = match &self.body {
            Some(RequestBody::Json(value)) => {
                Some(serde_json::to_string(value).map_err(Error::Serialization)?)
            }
            _ => None,
        };
        if let Some(text) = serialized {
            headers.insert("content-type".to_string(), "application/json".to_string());
            self.body = Some(RequestBody::Text(text));
        }

        if let Some(auth) = &self.basic_auth {
            let token = BASE64_ENGINE.encode(format!("{}:{}", auth.username, auth.password));
            headers.insert("authorization".to_string(), format!("Basic {}", token));
        }
        Ok(())
    }

    /// Decides whether a response is a redirect to follow, and returns the
    /// next hop's path if so. A response is terminal (None) when redirect
    /// following is disabled, the status code is anything but 301 or 302,
    /// the `location` header is missing, or its value is not an absolute
    /// http(s) URL.
    fn redirect_path(&self, status_code: i32, headers: &HashMap<String, String>) -> Option<String> {
        if !self.follow_redirects || (status_code != 301 && status_code != 302) {
            return None;
        }
        let location = headers.get("location")?;
        http_url::parse_location(location)
    }

    fn body_text(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn get_http_head(&self) -> String {
        let mut http = String::with_capacity(32);

        // Add the request line and the "Host" header
        write!(
            http,
            "{} {} HTTP/1.1\r\nHost: {}",
            self.target.method, self.target.path, self.target.host
        )
        .unwrap();
        if let Port::Explicit(port) = self.target.port {
            write!(http, ":{}", port).unwrap();
        }
        http += "\r\n";

        // Add other headers
        if let Some(headers) = &self.target.headers {
            for (k, v) in headers {
                write!(http, "{}: {}\r\n", k, v).unwrap();
            }
        }

        let has_length_header = self.target.headers.as_ref().is_some_and(|headers| {
            headers.keys().any(|key| {
                let key = key.to_lowercase();
                key == "content-length" || key == "transfer-encoding"
            })
        });
        if !has_length_header {
            if let Some(body) = self.body_text() {
                write!(http, "Content-Length: {}\r\n", body.len()).unwrap();
            } else if self.target.method == Method::Post
                || self.target.method == Method::Put
                || self.target.method == Method::Patch
            {
                // A user agent SHOULD send a Content-Length in a request message when no Transfer-Encoding
                // is sent and the request method defines a meaning for an enclosed payload body.
                // refer: https://tools.ietf.org/html/rfc7230#section-3.3.2
                http += "Content-Length: 0\r\n";
            }
        }

        http += "\r\n";
        http
    }

    /// Returns the HTTP request as bytes, ready to be sent to the server.
    pub(crate) fn as_bytes(&self) -> Vec<u8> {
        let mut head = self.get_http_head().into_bytes();
        if let Some(body) = self.body_text() {
            head.extend(body.as_bytes());
        }
        head
    }
}

#[cfg(test)]
mod normalizer_tests {
    use super::*;
    use serde_json::json;

    fn options() -> RequestOptions {
        RequestOptions::new(Transport::Http, "example.com", "/test/res")
    }

    #[test]
    fn headers_are_created_lazily() {
        let mut req = options();
        assert!(req.target.headers.is_none());
        req.normalize().unwrap();
        assert!(req.target.headers.is_some());
    }

    #[test]
    fn json_body_is_serialized_with_content_type() {
        let mut req = options().with_json(&json!({"id": 5})).unwrap();
        req.normalize().unwrap();
        assert_eq!(
            req.target.headers.as_ref().unwrap().get("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(req.body_text(), Some("{\"id\":5}"));
    }

    #[test]
    fn text_body_is_left_alone() {
        let mut req = options().with_body("plain");
        req.normalize().unwrap();
        assert!(req.target.headers.as_ref().unwrap().get("content-type").is_none());
        assert_eq!(req.body_text(), Some("plain"));
    }

    #[test]
    fn basic_auth_header_is_deterministic() {
        for _ in 0..2 {
            let mut req = options().with_basic_auth("harvey", "birdman");
            req.normalize().unwrap();
            assert_eq!(
                req.target.headers.as_ref().unwrap().get("authorization"),
                Some(&"Basic aGFydmV5OmJpcmRtYW4=".to_string())
            );
        }
    }

    #[test]
    fn basic_auth_overwrites_prior_authorization() {
        let mut req = options()
            .with_header("authorization", "Bearer nope")
            .with_basic_auth("harvey", "birdman");
        req.normalize().unwrap();
        assert_eq!(
            req.target.headers.as_ref().unwrap().get("authorization"),
            Some(&"Basic aGFydmV5OmJpcmRtYW4=".to_string())
        );
    }

    #[test]
    fn transport_selector_defaults_to_http() {
        assert_eq!(Transport::from_selector("https"), Transport::Https);
        assert_eq!(Transport::from_selector("http"), Transport::Http);
        assert_eq!(Transport::from_selector("gopher"), Transport::Http);
        assert_eq!(Transport::default(), Transport::Http);
    }
}

#[cfg(test)]
mod head_tests {
    use super::*;

    #[test]
    fn request_line_and_host() {
        let head = RequestOptions::new(Transport::Http, "example.com", "/test/res").get_http_head();
        assert!(head.starts_with("GET /test/res HTTP/1.1\r\nHost: example.com\r\n"));
    }

    #[test]
    fn explicit_port_shows_up_in_host() {
        let head = RequestOptions::new(Transport::Http, "example.com", "/")
            .with_port(8080)
            .get_http_head();
        assert!(head.contains("Host: example.com:8080\r\n"));
    }

    #[test]
    fn body_gets_a_content_length() {
        let req = RequestOptions::new(Transport::Http, "example.com", "/")
            .with_method(Method::Post)
            .with_body("hello");
        assert!(req.get_http_head().contains("Content-Length: 5\r\n"));
        assert!(req.as_bytes().ends_with(b"\r\n\r\nhello"));
    }

    #[test]
    fn empty_post_gets_a_zero_content_length() {
        let req = RequestOptions::new(Transport::Http, "example.com", "/")
            .with_method(Method::Post);
        assert!(req.get_http_head().contains("Content-Length: 0\r\n"));
    }
}
