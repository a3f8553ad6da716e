//! Opening the connection and exchanging the bytes of one request.

#[cfg(feature = "rustls")]
mod rustls_stream;
#[cfg(feature = "rustls")]
use rustls_stream::SecuredStream;

use crate::request::RequestOptions;
use crate::response::ResponseStream;
use crate::Error;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// A connection to the server for sending one request.
pub(crate) struct Connection<'a> {
    pub(crate) request: &'a RequestOptions,
    pub(crate) timeout_at: Option<Instant>,
}

impl<'a> Connection<'a> {
    /// Creates a new `Connection`. The timeout deadline is counted from
    /// here, so everything after this, including opening the TCP stream,
    /// eats into it.
    pub(crate) fn new(request: &'a RequestOptions) -> Connection<'a> {
        let timeout_at = request
            .timeout
            .map(|timeout| Instant::now() + Duration::from_secs(timeout));
        Connection {
            request,
            timeout_at,
        }
    }

    /// The time left until the deadline, if one was set. Errors out when the
    /// deadline has already passed.
    pub(crate) fn timeout(&self) -> Result<Option<Duration>, Error> {
        match self.timeout_at {
            Some(timeout_at) => match timeout_at.checked_duration_since(Instant::now()) {
                Some(duration) => Ok(Some(duration)),
                None => Err(Error::Transport(timeout_err())),
            },
            None => Ok(None),
        }
    }

    pub(crate) fn connect(&self) -> Result<TcpStream, Error> {
        let host = self.request.target.host.as_str();
        let port = self.request.target.port.port();
        #[cfg(feature = "log")]
        log::trace!("Establishing TCP connection to {}:{}.", host, port);
        let addrs = (host, port as u16)
            .to_socket_addrs()
            .map_err(Error::Transport)?;

        let mut last_err = None;
        for addr in addrs {
            let stream = match self.timeout()? {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match stream {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(Error::Transport(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "the hostname did not resolve to any addresses",
            )
        })))
    }

    /// Sends the request over plain TCP and hands back the response stream.
    pub(crate) fn send(self) -> Result<ResponseStream, Error> {
        let mut tcp = self.connect()?;
        #[cfg(feature = "log")]
        log::trace!("Writing HTTP request to {}.", self.request.target.host);
        tcp.set_write_timeout(self.timeout()?).map_err(Error::Transport)?;
        tcp.write_all(&self.request.as_bytes())?;
        #[cfg(feature = "log")]
        log::trace!("Reading HTTP response from {}.", self.request.target.host);
        ResponseStream::from_stream(HttpStream::create_plain(tcp, self.timeout_at))
    }

    /// Sends the request over TLS and hands back the response stream.
    #[cfg(feature = "rustls")]
    pub(crate) fn send_https(self) -> Result<ResponseStream, Error> {
        let stream = rustls_stream::create_secured_stream(&self)?;
        ResponseStream::from_stream(stream)
    }
}

/// The stream the response is read from, either plain TCP or TLS over TCP.
/// Reads enforce the request's deadline, if one was set.
pub(crate) enum HttpStream {
    Plain(TcpStream, Option<Instant>),
    #[cfg(feature = "rustls")]
    Secured(Box<SecuredStream>, Option<Instant>),
}

impl HttpStream {
    pub(crate) fn create_plain(stream: TcpStream, timeout_at: Option<Instant>) -> HttpStream {
        HttpStream::Plain(stream, timeout_at)
    }

    #[cfg(feature = "rustls")]
    pub(crate) fn create_secured(stream: SecuredStream, timeout_at: Option<Instant>) -> HttpStream {
        HttpStream::Secured(Box::new(stream), timeout_at)
    }
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read_timeout = |timeout_at: Option<Instant>| -> io::Result<Option<Duration>> {
            if let Some(timeout_at) = timeout_at {
                match timeout_at.checked_duration_since(Instant::now()) {
                    Some(duration) => Ok(Some(duration)),
                    None => Err(timeout_err()),
                }
            } else {
                Ok(None)
            }
        };
        match self {
            HttpStream::Plain(inner, timeout_at) => {
                inner.set_read_timeout(read_timeout(*timeout_at)?)?;
                inner.read(buf)
            }
            #[cfg(feature = "rustls")]
            HttpStream::Secured(inner, timeout_at) => {
                inner.get_ref().set_read_timeout(read_timeout(*timeout_at)?)?;
                inner.read(buf)
            }
        }
    }
}

fn timeout_err() -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        "the timeout of the request was reached",
    )
}
