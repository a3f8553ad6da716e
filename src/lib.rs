//! # onereq
//!
//! Options-driven, minimal-dependency HTTP request helper. One structured
//! [`RequestOptions`](struct.RequestOptions.html) value describes the whole
//! request, and [`send`](struct.RequestOptions.html#method.send) runs it
//! through a single pipeline: derived headers are filled in, the request is
//! issued over HTTP or HTTPS, redirects are optionally followed, and the
//! body of the terminal response is decoded according to its declared
//! content type.
//!
//! Note: as a minimal library, onereq has been written with the assumption
//! that servers are well-behaved. This means that there is little
//! error-correction for incoming data, which may cause some requests to
//! fail unexpectedly. If you're writing an application or library that
//! connects to servers you can't test beforehand, consider using a more
//! robust library, such as [curl](https://crates.io/crates/curl).
//!
//! # Additional features
//!
//! Optional functionality can be enabled by specifying features for the
//! `onereq` dependency in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! onereq = { version = "0.1", features = ["https"] }
//! ```
//!
//! ## `https` or `https-rustls`
//!
//! This feature uses the (very good)
//! [`rustls`](https://crates.io/crates/rustls) crate to secure the
//! connection when the [`Https`](enum.Transport.html#variant.Https)
//! transport is selected. Note that if this feature is not enabled (and it
//! is not by default), requests over the HTTPS transport will fail and
//! return a
//! [`HttpsFeatureNotEnabled`](enum.Error.html#variant.HttpsFeatureNotEnabled)
//! error.
//!
//! ## `log`
//!
//! This feature adds [`log`](https://crates.io/crates/log) trace calls in
//! the transport layer. Nothing is logged on the error path: all failures
//! surface in the returned `Result`, and the caller owns recovery policy.
//!
//! # Examples
//!
//! ## Get
//!
//! This is a simple example of sending a GET request and printing out the
//! response's body, status code, and reason phrase.
//!
//! ```no_run
//! # fn main() -> Result<(), onereq::Error> {
//! use onereq::{RequestOptions, Transport};
//!
//! let response = RequestOptions::new(Transport::Http, "example.com", "/").send()?;
//! assert_eq!(200, response.status_code);
//! assert_eq!("OK", response.reason_phrase);
//! println!("{}", response.raw_body);
//! # Ok(()) }
//! ```
//!
//! ## Body (sending)
//!
//! To include a body, add `with_body("<body contents>")` before `send()`,
//! or `with_json(&value)?` to send any serializable value as JSON (this
//! also sets the `content-type: application/json` header).
//!
//! ```no_run
//! # fn main() -> Result<(), onereq::Error> {
//! use onereq::{Method, RequestOptions, Transport};
//!
//! let response = RequestOptions::new(Transport::Http, "example.com", "/")
//!     .with_method(Method::Post)
//!     .with_body("Foobar")
//!     .send()?;
//! # Ok(()) }
//! ```
//!
//! ## Body (receiving)
//!
//! The terminal response's body is decoded based on its `content-type`
//! header: `application/json` bodies are parsed into a structured value,
//! everything else is handed over as the received text. See
//! [`DecodedBody`](enum.DecodedBody.html).
//!
//! ```no_run
//! # fn main() -> Result<(), onereq::Error> {
//! use onereq::{DecodedBody, RequestOptions, Transport};
//!
//! let response = RequestOptions::new(Transport::Http, "example.com", "/users.json").send()?;
//! if let DecodedBody::Json(users) = &response.body {
//!     println!("first user: {}", users[0]["name"]);
//! }
//! # Ok(()) }
//! ```
//!
//! ## Basic auth
//!
//! `with_basic_auth` sets the `authorization` header to
//! `Basic <base64(username:password)>` before the request goes out. The
//! credentials are not validated: a colon inside the username produces
//! ambiguous, but not rejected, credentials.
//!
//! ```no_run
//! # fn main() -> Result<(), onereq::Error> {
//! use onereq::{RequestOptions, Transport};
//!
//! let response = RequestOptions::new(Transport::Http, "example.com", "/private")
//!     .with_basic_auth("harvey", "birdman")
//!     .send()?;
//! # Ok(()) }
//! ```
//!
//! ## Redirects
//!
//! Redirect following is disabled by default; enable it with
//! `with_follow_redirects(true)`. A 301 or 302 response with a `location`
//! header then causes the pipeline to repeat with the path taken from the
//! location URL, up to `with_max_redirects` hops (100 by default). The
//! host, port and transport are kept from the original request even when
//! the location points at another origin: cross-origin redirects silently
//! keep requesting the original host.
//!
//! ```no_run
//! # fn main() -> Result<(), onereq::Error> {
//! use onereq::{RequestOptions, Transport};
//!
//! let response = RequestOptions::new(Transport::Http, "example.com", "/old-path")
//!     .with_follow_redirects(true)
//!     .send()?;
//! # Ok(()) }
//! ```
//!
//! # Timeouts
//!
//! By default, a request has no timeout. Use
//! [`with_timeout`](struct.RequestOptions.html#method.with_timeout) on your
//! request to set the timeout in seconds, which is applied to the
//! underlying socket:
//!
//! ```no_run
//! # use onereq::{RequestOptions, Transport};
//! RequestOptions::new(Transport::Http, "example.com", "/").with_timeout(8).send();
//! ```
//!
//! # Limitations
//!
//! This is not a full HTTP client. There is no connection pooling, no retry
//! or backoff policy, no cookie jar, and no streaming response API. The
//! response body is accumulated in memory without a size cap, so very large
//! responses grow memory without bound. Redirects never change the host,
//! port or transport, as described above.

#![deny(missing_docs)]

mod connection;
mod error;
mod http_url;
mod request;
mod response;

pub use error::*;
pub use request::*;
pub use response::*;
