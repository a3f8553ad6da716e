use std::collections::HashMap;
use std::error;
use std::fmt;
use std::io;
use std::str;

/// Represents an error while sending a request or receiving, parsing or
/// decoding the response.
#[derive(Debug)]
pub enum Error {
    /// Ran into an I/O problem while connecting, sending the request, or
    /// loading the response. This covers DNS resolution failures, refused
    /// and reset connections, and timeouts.
    Transport(io::Error),
    /// The structured request body could not be serialized into JSON. This
    /// is returned before any network activity happens.
    Serialization(serde_json::Error),
    /// The response declared `content-type: application/json`, but its body
    /// did not parse as JSON. The status code and headers of the offending
    /// response are carried along, as the response itself is consumed by the
    /// failed decode.
    BodyDecode {
        /// Status code of the response whose body failed to decode.
        status_code: i32,
        /// Headers of the response whose body failed to decode.
        headers: HashMap<String, String>,
        /// The underlying JSON parse error.
        source: serde_json::Error,
    },
    /// Followed more redirects than the request's limit allows. See
    /// [`with_max_redirects`](struct.RequestOptions.html#method.with_max_redirects).
    TooManyRedirects,
    /// Couldn't parse the incoming chunk's length while receiving a
    /// response with the header `Transfer-Encoding: chunked`.
    MalformedChunkLength,
    /// The chunk did not end after the expected amount of bytes while
    /// receiving a response with the header `Transfer-Encoding: chunked`.
    MalformedChunkEnd,
    /// Couldn't parse the `Content-Length` header's value as an `usize`.
    MalformedContentLength,
    /// The response body is not valid UTF-8, and the response encoding was
    /// UTF-8.
    InvalidUtf8InBody(str::Utf8Error),
    /// The response contained invalid UTF-8 where it should be valid (eg.
    /// the status line or the headers).
    InvalidUtf8InResponse,
    /// A TLS session could not be set up for an HTTPS request.
    #[cfg(feature = "rustls")]
    RustlsCreateConnection(rustls::Error),
    /// The request's transport is HTTPS, but the crate was compiled without
    /// a TLS feature.
    HttpsFeatureNotEnabled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Transport(err) => write!(f, "{}", err),
            Serialization(err) => write!(f, "failed to serialize the request body: {}", err),
            BodyDecode { source, .. } => {
                write!(f, "failed to decode the response body as json: {}", source)
            }
            TooManyRedirects => write!(f, "the redirect limit of the request was reached"),
            MalformedChunkLength => {
                write!(f, "non-usize chunk length with transfer-encoding: chunked")
            }
            MalformedChunkEnd => {
                write!(f, "chunk did not end after the expected amount of bytes")
            }
            MalformedContentLength => write!(f, "non-usize content length"),
            InvalidUtf8InBody(err) => write!(f, "one of the bytes in the body is not utf-8: {}", err),
            InvalidUtf8InResponse => {
                write!(f, "response contained invalid utf-8 where valid utf-8 was expected")
            }
            #[cfg(feature = "rustls")]
            RustlsCreateConnection(err) => write!(f, "failed to create a tls connection: {}", err),
            HttpsFeatureNotEnabled => {
                write!(f, "https requested, but the crate was compiled without a tls feature")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        use Error::*;
        match self {
            Transport(err) => Some(err),
            Serialization(err) => Some(err),
            BodyDecode { source, .. } => Some(source),
            InvalidUtf8InBody(err) => Some(err),
            #[cfg(feature = "rustls")]
            RustlsCreateConnection(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(other: io::Error) -> Error {
        Error::Transport(other)
    }
}
