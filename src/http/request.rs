use std::collections::HashMap;
use std::io::{BufReader, Read};

use crate::errors::{Error, Result};
use crate::http::{content_length, header_pairs, read_body};

/// Represents an HTTP request.
#[derive(Debug)]
pub struct Request {
    /// The HTTP method used in the request
    pub method: String,
    /// The full path of the request, query string included
    pub path: String,
    /// Headers of the request
    pub headers: Vec<(String, String)>,
    /// Body of the request
    pub body: String,
}

impl Request {
    /// Create a new request from scratch
    pub fn new(method: &str, path: &str, headers: Vec<(String, String)>, body: String) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
            body,
        }
    }
    /// Create a new GET request for the given path, with an empty body
    pub fn get(path: &str) -> Request {
        Request::new("GET", path, vec![], "".to_string())
    }
    /// Create a new POST request for the given path, with the given body
    pub fn post(path: &str, body: String) -> Request {
        Request::new("POST", path, vec![], body)
    }
    /// Create a new PUT request for the given path, with the given body
    pub fn put(path: &str, body: String) -> Request {
        Request::new("PUT", path, vec![], body)
    }

    /// Add a header, builder style
    pub fn with_header(mut self, name: &str, value: &str) -> Request {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of the first header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the named cookie, looked up in every `Cookie` header
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("Cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
    }

    /// The path without its query string, which is what gets routed
    pub fn route_path(&self) -> &str {
        self.path
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.path)
    }

    /// Decoded query string parameters. Later duplicates win.
    pub fn query(&self) -> HashMap<String, String> {
        self.path
            .split_once('?')
            .map(|(_, query)| {
                query
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| {
                        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                        (percent_decode(k), percent_decode(v))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Decode `application/x-www-form-urlencoded` escapes. Invalid escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("3f");
                out.push(u8::from_str_radix(hex, 16).unwrap_or(b'?'));
                i += 2;
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

/// Largest request line plus headers accepted before giving up on a request
pub const MAX_HEAD_LEN: usize = 64 * 1024;

/// Parse an HTTP request from a byte stream
pub fn parse_request<T>(buf_reader: BufReader<T>) -> Result<Request>
where
    T: Sized + Read,
{
    parse_request_with_limit(buf_reader, usize::MAX)
}

/// Parse an HTTP request from a byte stream, refusing bodies larger than `max_body` bytes
pub fn parse_request_with_limit<T>(mut buf_reader: BufReader<T>, max_body: usize) -> Result<Request>
where
    T: Sized + Read,
{
    let mut buf = [0; 4096];
    let mut data: Vec<u8> = Vec::new();

    let (body_len, parsed_len, mut request) = loop {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);

        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(&data)? {
            httparse::Status::Complete(parsed_len) => {
                let body_len = content_length(req.headers);
                break (
                    body_len,
                    parsed_len,
                    Request {
                        method: req.method.unwrap_or("GET").to_string(),
                        path: req.path.unwrap_or("/").to_string(),
                        headers: header_pairs(req.headers),
                        body: "".to_string(),
                    },
                );
            }
            httparse::Status::Partial if data.len() > MAX_HEAD_LEN => {
                return Err(Error::HeadTooLarge(MAX_HEAD_LEN))
            }
            httparse::Status::Partial => continue,
        }
    };

    if body_len > max_body {
        return Err(Error::PayloadTooLarge(max_body));
    }

    // One request per connection, anything past the announced body is dropped
    request.body = read_body(&mut buf_reader, data, parsed_len, body_len)?;
    Ok(request)
}
