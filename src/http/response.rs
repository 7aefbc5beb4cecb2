use std::io::{BufReader, Read};

use serde::Serialize;

use crate::api::{ApiError, ApiResponse};
use crate::errors::{Error, Result};
use crate::http::{content_length, header_pairs, read_body};

/// An HTTP response to be sent to a client
#[derive(Debug)]
pub struct Response {
    /// Status code of the response. Optional because that's what httparse returns, but it
    /// shouldn't happen in practice since we control the responses.
    pub status: Option<u16>,
    /// Headers for the response. It is not necessary to add Content-Length to it, this is done
    /// automatically on serialization.
    pub headers: Vec<(String, String)>,
    /// Body of the response. Give an empty string for an empty body
    pub body: String,
}

impl Response {
    /// Creates an empty OK response (204)
    pub fn ok() -> Response {
        Response {
            status: Some(204),
            headers: vec![],
            body: "".to_string(),
        }
    }

    /// Creates an OK (200) response with the given body
    pub fn ok_with_body(str: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body: str,
        }
    }

    /// Creates a JSON response wrapping `data` in the success envelope
    pub fn json<T: Serialize>(status: u16, data: T, message: &str) -> Result<Response> {
        let body = serde_json::to_string(&ApiResponse::new(status, data, message))?;
        Ok(Response {
            status: Some(status),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        })
    }

    /// Creates an error response in the error envelope.
    ///
    /// The code must be in the 4xx or 5xx range.
    pub fn error(code: u16, message: &str) -> Response {
        let code = if (400..600).contains(&code) { code } else { 500 };
        let envelope = ApiError {
            status_code: code,
            message: message.to_string(),
            success: false,
        };
        Response {
            status: Some(code),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_string(&envelope).unwrap_or_default(),
        }
    }

    /// Creates the response reported to the client for a failed request
    pub fn from_error(err: &Error) -> Response {
        Self::error(err.status_code(), &err.public_message())
    }

    /// Add a header, builder style. Repeated names are kept, as needed for Set-Cookie.
    pub fn with_header(mut self, name: &str, value: &str) -> Response {
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

    /// Every value of the given header
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse an HTTP response from a byte stream
pub fn parse_response<T>(mut buf_reader: BufReader<T>) -> Result<Response>
where
    T: Sized + Read,
{
    let mut buf = [0; 4096];
    let mut data: Vec<u8> = Vec::new();

    let (body_len, parsed_len, mut response) = loop {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);

        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(&data)? {
            httparse::Status::Complete(parsed_len) => {
                break (
                    content_length(resp.headers),
                    parsed_len,
                    Response {
                        status: resp.code,
                        headers: header_pairs(resp.headers),
                        body: "".to_string(),
                    },
                );
            }
            httparse::Status::Partial => continue,
        }
    };

    response.body = read_body(&mut buf_reader, data, parsed_len, body_len)?;
    Ok(response)
}
