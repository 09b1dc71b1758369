use anyhow::{Result, bail};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use std::io::{self, Read};
use std::time::Duration;

use super::ArchiveSource;

const DEFAULT_MAX_RETRY: u32 = 10;

/// Streamed HTTP GET body of a remote ZIP file
///
/// The body is read front to back as the reader asks for bytes; no Range
/// requests are needed since the archive is consumed in a single pass.
pub struct HttpSource {
    // Owned per source so it is dropped on the worker thread that used it
    _client: Client,
    response: Option<Response>,
    url: String,
    transferred_bytes: u64,
}

impl HttpSource {
    /// Send the GET request, retrying connection failures
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with_retries(url, DEFAULT_MAX_RETRY)
    }

    pub fn open_with_retries(url: &str, max_retry: u32) -> Result<Self> {
        // Body reads may take as long as the worker needs
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()?;

        let mut retry_count = 0;
        let response = loop {
            match client.get(url).send() {
                Ok(resp) => break resp,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= max_retry {
                        bail!("Max retries exceeded for {url}: {e}");
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, max_retry, e
                    );
                    std::thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(e.into()),
            }
        };

        if !response.status().is_success() {
            bail!("HTTP request failed with status: {}", response.status());
        }

        Ok(Self {
            _client: client,
            response: Some(response),
            url: url.to_string(),
            transferred_bytes: 0,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// Size announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.response.as_ref().and_then(Response::content_length)
    }
}

impl Read for HttpSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(response) = self.response.as_mut() else {
            return Err(io::Error::other(format!("{} is already closed", self.url)));
        };
        let n = response.read(buf)?;
        self.transferred_bytes += n as u64;
        Ok(n)
    }
}

impl ArchiveSource for HttpSource {
    fn close(&mut self) -> io::Result<()> {
        if self.response.take().is_some() {
            debug!(
                "closed {} after {} bytes transferred",
                self.url, self.transferred_bytes
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;
    use crate::io::{DefaultOpener, SourceOpener, WorkUnit};
    use crate::reader::ArchiveRecordReader;
    use crate::zip::testutil::{EntryBuilder, archive};
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    /// Answer a single request with `status` and `body`, returning the URL.
    fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });

        format!("http://{addr}/input/zip-01.zip")
    }

    fn small_archive() -> Vec<u8> {
        archive(&[
            EntryBuilder::stored("x.txt", b"hello world"),
            EntryBuilder::deflated("docs/notes.txt", &b"remote text ".repeat(100)),
        ])
    }

    #[test]
    fn streams_the_body_and_counts_bytes() {
        let bytes = small_archive();
        let url = serve_once("200 OK", bytes.clone());

        let mut source = HttpSource::open(&url).unwrap();
        assert_eq!(source.content_length(), Some(bytes.len() as u64));

        let mut body = Vec::new();
        source.read_to_end(&mut body).unwrap();
        assert_eq!(body, bytes);
        assert_eq!(source.transferred_bytes(), bytes.len() as u64);

        source.close().unwrap();
        source.close().unwrap();
        assert!(source.read(&mut [0u8; 4]).is_err());
    }

    #[test]
    fn reader_over_remote_archive() {
        let url = serve_once("200 OK", small_archive());

        let unit = WorkUnit::new(url);
        assert!(unit.is_http_url());
        let source = DefaultOpener.open(&unit).unwrap();

        let mut reader = ArchiveRecordReader::new(ReaderConfig::default());
        reader.initialize(source).unwrap();
        let names: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["x.txt", "docs/notes.txt"]);
    }

    #[test]
    fn rejects_error_status() {
        let url = serve_once("404 Not Found", b"missing".to_vec());
        let err = HttpSource::open(&url).err().unwrap();
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[test]
    fn retries_refused_connections_with_backoff() {
        // Bind then release a port so nothing listens on it
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let started = Instant::now();
        let err = HttpSource::open_with_retries(&format!("http://127.0.0.1:{port}/a.zip"), 2)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Max retries exceeded"), "{err}");
        // One retry, sleeping 500ms before it
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
