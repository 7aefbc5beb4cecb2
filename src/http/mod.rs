pub mod server;
pub use server::*;

pub mod request;
pub use request::*;

pub mod response;
pub use response::*;

pub mod client;
pub use client::*;

use std::io::{BufReader, Read};

use crate::errors::{Error, Result};

/// Value of the Content-Length header, 0 if absent or invalid
fn content_length(headers: &[httparse::Header]) -> usize {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|length| String::from_utf8_lossy(length.value).trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Copy parsed headers into owned pairs
fn header_pairs(headers: &[httparse::Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Read until `body_len` bytes following the head are buffered, then return them as text
fn read_body<T: Read>(
    buf_reader: &mut BufReader<T>,
    mut data: Vec<u8>,
    parsed_len: usize,
    body_len: usize,
) -> Result<String> {
    let mut buf = [0; 4096];
    while data.len() - parsed_len < body_len {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);
    }
    Ok(String::from_utf8_lossy(&data[parsed_len..parsed_len + body_len]).to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_simple_http_request() {
        // It may fail if the port is already in use by something else
        static ADDR: &str = "127.0.0.1:18422";

        let handle = std::thread::spawn(|| {
            let server = HttpServer::new(ADDR);
            match server {
                Ok(s) => s.serve_once(|request| {
                    let body = format!("{} {} {}", request.method, request.path, request.body);
                    Response::ok_with_body(body).with_header("X-Echo", "yes")
                }),
                Err(err) => eprintln!("Failed to spawn server: {}", err),
            }
        });

        let mut client = (|| {
            for _ in 1..10 {
                match HttpClient::new(ADDR) {
                    Ok(c) => return Some(c),
                    Err(_) => std::thread::sleep(std::time::Duration::from_millis(10)),
                }
            }
            None
        })()
        .expect("Failed to connect client");

        let resp = client
            .send("POST", "/api/v1/order/orders", &[("Cookie", "accessToken=t")], "{}")
            .expect("Failed to communicate with server");

        assert_eq!(resp.status, Some(200));
        assert_eq!(resp.header("x-echo"), Some("yes"));
        assert_eq!(resp.body, "POST /api/v1/order/orders {}");

        handle.join().unwrap();
    }
}
