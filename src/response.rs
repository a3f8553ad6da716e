use crate::connection::HttpStream;
use crate::request::ResponseEncoding;
use crate::Error;
use std::collections::HashMap;
use std::io::{self, BufReader, Read};

/// The body of a terminal response, shaped by its `content-type` header.
///
/// A response with `content-type: application/json` and a non-empty body is
/// parsed into [`Json`](#variant.Json). Everything else, including bodies
/// with no content-type at all and empty bodies regardless of content-type,
/// is handed over as [`Text`](#variant.Text), unchanged.
#[derive(Clone, PartialEq, Debug)]
pub enum DecodedBody {
    /// The body text, as received.
    Text(String),
    /// The body parsed as JSON.
    Json(serde_json::Value),
}

impl DecodedBody {
    /// Returns the text if this body was left undecoded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedBody::Text(text) => Some(text),
            DecodedBody::Json(_) => None,
        }
    }

    /// Returns the parsed JSON value, if the body was decoded as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            DecodedBody::Text(_) => None,
            DecodedBody::Json(value) => Some(value),
        }
    }
}

/// An HTTP response.
///
/// Returned by [`RequestOptions::send`](struct.RequestOptions.html#method.send)
/// once the response is terminal: either it was not a redirect, or the
/// redirect chain has been followed to its end.
#[derive(Clone, PartialEq, Debug)]
pub struct Response {
    /// The status code of the response, eg. 404.
    pub status_code: i32,
    /// The reason phrase of the response, eg. "Not Found".
    pub reason_phrase: String,
    /// The headers of the response. The header field names (the
    /// keys) are all lowercase.
    pub headers: HashMap<String, String>,
    /// The response body as text, accumulated from every received chunk and
    /// decoded with the configured response encoding.
    pub raw_body: String,
    /// The response body after content-type-driven decoding. See
    /// [`DecodedBody`](enum.DecodedBody.html).
    pub body: DecodedBody,
}

impl Response {
    pub(crate) fn create(
        mut parent: ResponseStream,
        is_head: bool,
        encoding: ResponseEncoding,
    ) -> Result<Response, Error> {
        let mut body = Vec::new();
        if !is_head && parent.status_code != 204 && parent.status_code != 304 {
            parent.read_to_end(&mut body)?;
        }

        let ResponseStream {
            status_code,
            reason_phrase,
            headers,
            ..
        } = parent;

        let raw_body = decode_text(body, encoding)?;
        let body = decode_body(status_code, &headers, &raw_body)?;

        Ok(Response {
            status_code,
            reason_phrase,
            headers,
            raw_body,
            body,
        })
    }

    /// Converts the body to a `struct` using Serde.
    ///
    /// This parses [`raw_body`](#structfield.raw_body) regardless of the
    /// response's content-type, unlike [`body`](#structfield.body).
    ///
    /// # Errors
    ///
    /// Returns
    /// [`BodyDecode`](enum.Error.html#variant.BodyDecode) if
    /// Serde runs into a problem.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use serde_json::Value;
    ///
    /// # fn main() -> Result<(), onereq::Error> {
    /// let response = onereq::RequestOptions::new(onereq::Transport::Http, "example.org", "/resource.json")
    ///     .send()?;
    /// // Value could be any type that implements Deserialize!
    /// let user: Value = response.json()?;
    /// println!("User name is '{}'", user["name"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn json<'a, T>(&'a self) -> Result<T, Error>
    where
        T: serde::de::Deserialize<'a>,
    {
        match serde_json::from_str(&self.raw_body) {
            Ok(json) => Ok(json),
            Err(err) => Err(Error::BodyDecode {
                status_code: self.status_code,
                headers: self.headers.clone(),
                source: err,
            }),
        }
    }
}

/// Decodes the accumulated body bytes into text.
fn decode_text(bytes: Vec<u8>, encoding: ResponseEncoding) -> Result<String, Error> {
    match encoding {
        ResponseEncoding::Utf8 => {
            String::from_utf8(bytes).map_err(|err| Error::InvalidUtf8InBody(err.utf8_error()))
        }
        ResponseEncoding::Latin1 => Ok(bytes.iter().map(|&byte| char::from(byte)).collect()),
    }
}

/// Decides the shape of the returned body. Empty bodies and bodies without a
/// content-type are passed through as-is, a `content-type` whose MIME type
/// (parameters such as charset ignored) is exactly `application/json` gets
/// parsed, and every other MIME type is passed through as text.
fn decode_body(
    status_code: i32,
    headers: &HashMap<String, String>,
    raw_body: &str,
) -> Result<DecodedBody, Error> {
    let content_type = match headers.get("content-type") {
        Some(value) => value,
        None => return Ok(DecodedBody::Text(raw_body.to_string())),
    };
    // Guards against content-type-without-body responses, eg. a 200 with
    // `content-type: application/json` and a zero-length body.
    if raw_body.is_empty() {
        return Ok(DecodedBody::Text(String::new()));
    }

    let mime_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type.as_str())
        .trim();
    if mime_type.eq_ignore_ascii_case("application/json") {
        match serde_json::from_str(raw_body) {
            Ok(value) => Ok(DecodedBody::Json(value)),
            Err(err) => Err(Error::BodyDecode {
                status_code,
                headers: headers.clone(),
                source: err,
            }),
        }
    } else {
        Ok(DecodedBody::Text(raw_body.to_string()))
    }
}

/// The response as it is read off the wire: parsed status line and headers,
/// with the body streamed through [`std::io::Read`]. The redirect decision
/// is made on this, before the body is consumed.
pub(crate) struct ResponseStream {
    /// The status code of the response, eg. 404.
    pub(crate) status_code: i32,
    /// The reason phrase of the response, eg. "Not Found".
    pub(crate) reason_phrase: String,
    /// The headers of the response, keys lowercased.
    pub(crate) headers: HashMap<String, String>,

    stream: BufReader<HttpStream>,
    state: HttpStreamState,
}

impl ResponseStream {
    pub(crate) fn from_stream(stream: HttpStream) -> Result<ResponseStream, Error> {
        let mut stream = BufReader::new(stream);
        let ResponseMetadata {
            status_code,
            reason_phrase,
            headers,
            state,
        } = read_metadata(&mut stream)?;

        Ok(ResponseStream {
            status_code,
            reason_phrase,
            headers,
            stream,
            state,
        })
    }
}

impl Read for ResponseStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use HttpStreamState::*;
        match &mut self.state {
            // If we're reading until the TCP stream closes,
            // just... read it!
            EndOnClose => self.stream.read(buf),
            // If we have a content length, read up to the remaining number
            // of bytes, or the buffer size, whichever is smaller.
            ContentLength { to_go } => {
                if *to_go == 0 {
                    return Ok(0);
                }

                let to_read = buf.len().min(*to_go);
                let n = self.stream.read(&mut buf[..to_read])?;
                *to_go -= n;
                Ok(n)
            }
            Chunked { more_chunks, to_go } => {
                read_chunked(buf, &mut self.stream, &mut self.headers, more_chunks, to_go)
            }
        }
    }
}

fn read_trailers(
    stream: &mut BufReader<HttpStream>,
    headers: &mut HashMap<String, String>,
) -> Result<(), Error> {
    loop {
        let trailer_line = read_line(stream)?;
        if let Some((header, value)) = parse_header(trailer_line) {
            headers.insert(header, value);
        } else {
            break;
        }
    }
    Ok(())
}

fn read_chunked(
    buf: &mut [u8],
    stream: &mut BufReader<HttpStream>,
    headers: &mut HashMap<String, String>,
    more_chunks: &mut bool,
    to_go: &mut usize, // In the current chunk
) -> io::Result<usize> {
    if !*more_chunks && *to_go == 0 {
        return Ok(0);
    }

    // Save some typing:
    fn bail<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, e))
    }

    // If we have no bytes left to read in the current chunk,
    // but we're still expecting more chunks,
    // read the length of the next one.
    if *to_go == 0 {
        let length_line = match read_line(stream) {
            Ok(line) => line,
            Err(err) => return bail(err),
        };

        // Note: the trim() and check for empty lines shouldn't be
        // needed according to the RFC, but we might as well, it's a
        // small change and it fixes a few servers.
        let incoming_length = if length_line.is_empty() {
            0
        } else {
            // Chunk extensions are ignored.
            let length = if let Some(i) = length_line.find(';') {
                length_line[..i].trim()
            } else {
                length_line.trim()
            };
            match usize::from_str_radix(length, 16) {
                Ok(length) => length,
                Err(_) => return bail(Error::MalformedChunkLength),
            }
        };

        // If the incoming length is 0, we're done. There's no more chunks.
        // Read the trailers and get out.
        if incoming_length == 0 {
            *more_chunks = false;

            if let Err(err) = read_trailers(stream, headers) {
                return bail(err);
            }
            return Ok(0);
        }
        *to_go = incoming_length;
    }

    let to_read = buf.len().min(*to_go);
    let bytes_read = stream.read(&mut buf[..to_read])?;
    *to_go -= bytes_read;

    // At the end of the chunk, the trailing \r\n needs to be consumed too.
    if *to_go == 0 {
        match read_line(stream) {
            Ok(line) if line.is_empty() => {}
            Ok(_) => return bail(Error::MalformedChunkEnd),
            Err(err) => return bail(err),
        }
    }
    Ok(bytes_read)
}

enum HttpStreamState {
    // No Content-Length and Transfer-Encoding != chunked: read until the
    // server closes the connection.
    EndOnClose,
    // Content-Length was specified, store the number of bytes remaining.
    ContentLength { to_go: usize },
    // Transfer-Encoding == chunked: are we expecting more chunks, and how
    // much is left of the current one?
    Chunked { more_chunks: bool, to_go: usize },
}

// Only used while constructing a ResponseStream, so that the parsed parts
// can travel together.
struct ResponseMetadata {
    status_code: i32,
    reason_phrase: String,
    headers: HashMap<String, String>,
    state: HttpStreamState,
}

fn read_metadata(stream: &mut BufReader<HttpStream>) -> Result<ResponseMetadata, Error> {
    let line = read_line(stream)?;
    let (status_code, reason_phrase) = parse_status_line(&line);

    let mut headers = HashMap::new();
    loop {
        let line = read_line(stream)?;
        if line.is_empty() {
            // Body starts here
            break;
        }
        if let Some(header) = parse_header(line) {
            headers.insert(header.0, header.1);
        }
    }

    let mut chunked = false;
    let mut content_length = None;
    for (header, value) in &headers {
        if header == "transfer-encoding" && value.to_lowercase().trim() == "chunked" {
            chunked = true;
        }
        if header == "content-length" {
            match value.trim().parse::<usize>() {
                Ok(length) => content_length = Some(length),
                Err(_) => return Err(Error::MalformedContentLength),
            }
        }
    }

    let state = if chunked {
        HttpStreamState::Chunked {
            more_chunks: true,
            to_go: 0,
        }
    } else if let Some(length) = content_length {
        HttpStreamState::ContentLength { to_go: length }
    } else {
        HttpStreamState::EndOnClose
    };

    Ok(ResponseMetadata {
        status_code,
        reason_phrase,
        headers,
        state,
    })
}

fn read_line(stream: &mut BufReader<HttpStream>) -> Result<String, Error> {
    let mut bytes = Vec::with_capacity(32);
    for byte in stream.bytes() {
        let byte = byte.map_err(Error::Transport)?;
        if byte == b'\n' {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8InResponse)
}

fn parse_status_line(line: &str) -> (i32, String) {
    // Sample status line format: HTTP/1.1 200 OK
    let mut parts = line.splitn(3, ' ');
    let status_code = parts.nth(1).and_then(|code| code.parse::<i32>().ok());
    let reason_phrase = parts.next().unwrap_or("").to_string();

    match status_code {
        Some(status_code) => (status_code, reason_phrase),
        None => (503, "Server did not provide a status line".to_string()),
    }
}

fn parse_header(mut line: String) -> Option<(String, String)> {
    let separator = line.find(':')?;
    let value = line[separator + 1..].trim_start().to_string();
    line.truncate(separator);
    // Headers are case-insensitive, lowercase them for unified lookups.
    line.make_ascii_lowercase();
    Some((line, value))
}

#[cfg(test)]
mod decoding_tests {
    use super::{decode_body, DecodedBody};
    use serde_json::json;
    use std::collections::HashMap;

    fn headers(content_type: Option<&str>) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(content_type) = content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        headers
    }

    #[test]
    fn no_content_type_returns_text() {
        let body = decode_body(200, &headers(None), "basic").unwrap();
        assert_eq!(body, DecodedBody::Text("basic".to_string()));
    }

    #[test]
    fn empty_body_is_returned_unchanged() {
        let body = decode_body(200, &headers(Some("application/json")), "").unwrap();
        assert_eq!(body, DecodedBody::Text(String::new()));
    }

    #[test]
    fn json_content_type_is_parsed() {
        let body = decode_body(
            200,
            &headers(Some("application/json")),
            "[{\"id\":5,\"name\":\"Harvey Birdman\"}]",
        )
        .unwrap();
        assert_eq!(
            body,
            DecodedBody::Json(json!([{"id": 5, "name": "Harvey Birdman"}]))
        );
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let body = decode_body(200, &headers(Some("application/json;charset=utf-8")), "{}").unwrap();
        assert_eq!(body, DecodedBody::Json(json!({})));
    }

    #[test]
    fn other_content_types_return_text() {
        let body = decode_body(200, &headers(Some("text/html")), "{\"not\":\"parsed\"}").unwrap();
        assert_eq!(body, DecodedBody::Text("{\"not\":\"parsed\"}".to_string()));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let result = decode_body(200, &headers(Some("application/json")), "not json");
        match result {
            Err(crate::Error::BodyDecode {
                status_code,
                headers,
                ..
            }) => {
                assert_eq!(status_code, 200);
                assert_eq!(
                    headers.get("content-type"),
                    Some(&"application/json".to_string())
                );
            }
            other => panic!("expected a decode error, got {:?}", other),
        }
    }
}
