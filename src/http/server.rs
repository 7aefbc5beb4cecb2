use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};

use tracing::{debug, info, warn};

use crate::errors::{self, Error};
use crate::http::{parse_request_with_limit, Request, Response};
use crate::threadpool::ThreadPool;

/// Largest request body accepted by the server
pub const MAX_BODY_LEN: usize = 16 * 1024;

/// Turn an HTTP status code into its string representation
pub fn code_to_string(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown Status",
    }
}

/// This is the main server.
///
/// It listens for incomming connections on a TCP socket, parses the requests and dispatches them
/// to a handler. Whatever the handler produces is then converted in an HTTP response and sent
/// back to the client.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Create a new server listening on the given address
    pub fn new(addr: &str) -> errors::Result<Self> {
        Ok(HttpServer {
            listener: TcpListener::bind(addr)?,
        })
    }

    /// Start the server
    ///
    /// Calls the handler with the incoming requests, on a pool of `workers` threads.
    ///
    /// This function is blocking, with no real way of stopping it (except the socket being
    /// forcefully closed by the OS or the program being killed)
    pub fn serve<F>(&self, workers: usize, handler: F)
    where
        F: Fn(Request) -> Response + Send + Sync + 'static + Clone,
    {
        let threadpool = ThreadPool::new(workers.max(1));
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, workers, "Server running");
        }

        for stream in self.listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    continue;
                }
            };
            let handler = handler.clone();
            threadpool.execute(move || handle_stream(&mut stream, &handler))
        }
    }

    /// Utility function for one-shot servers.
    ///
    /// This is mostly for testing, it listens to a single connection, processes the
    /// request and exit.
    pub fn serve_once<F>(&self, handler: F)
    where
        F: Fn(Request) -> Response,
    {
        match self.listener.accept() {
            Ok((mut stream, _)) => handle_stream(&mut stream, &handler),
            Err(err) => warn!(error = %err, "Failed to accept connection"),
        }
    }
}

/// Parse an HTTP request from a TCP stream, calls the handler and write back the answer
fn handle_stream<F>(mut stream: &mut TcpStream, handler: F)
where
    F: Fn(Request) -> Response,
{
    let buf_reader = BufReader::new(&mut stream);
    match parse_request_with_limit(buf_reader, MAX_BODY_LEN) {
        Ok(req) => respond(stream, handler(req)),
        Err(Error::ConnectionReset) => debug!("Connection closed before a full request"),
        Err(err) => {
            warn!(error = %err, "Rejecting unparsable request");
            respond(stream, Response::from_error(&err))
        }
    }
}

/// Writes an HTTP response to a stream
fn respond(stream: &mut TcpStream, resp: Response) {
    let code = resp.status.unwrap_or(500);
    let status = stream.write_all(
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            code,
            code_to_string(code),
            resp.body.len(),
            resp.headers
                .iter()
                .map(|(k, v)| format!["{}: {}\r\n", k, v])
                .collect::<Vec<_>>()
                .join(""),
            resp.body
        )
        .as_bytes(),
    );

    if let Err(err) = status {
        warn!(error = %err, "Failed to respond");
    }
}
