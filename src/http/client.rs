use std::io::{BufReader, Write};
use std::net::TcpStream;

use crate::errors;
use crate::http::{parse_response, Response};

/// Simple HTTP client
///
/// It sends HTTP requests from a set of parameters, then parses and yields the server response.
pub struct HttpClient {
    host: String,
    stream: TcpStream,
}

impl HttpClient {
    /// Create a new client connected to the given server.
    ///
    /// An error is returned if the connection cannot be made for whatever reason
    pub fn new(server: &str) -> errors::Result<Self> {
        Ok(HttpClient {
            host: server.to_string(),
            stream: TcpStream::connect(server)?,
        })
    }

    /// Send an HTTP request on the open connection.
    ///
    /// The server closes the connection after each response, so drop the client once the
    /// response is retrieved.
    pub fn send(
        &mut self,
        method: &str,
        endpoint: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> errors::Result<Response> {
        let extra_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}: {}\r\n", k, v))
            .collect();

        self.stream.write_all(
            format! {
                "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{}\r\n{}",
                method, endpoint, self.host, body.len(), extra_headers, body
            }
            .as_bytes(),
        )?;

        let buf_reader = BufReader::new(&mut self.stream);
        parse_response(buf_reader)
    }
}
