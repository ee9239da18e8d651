//! HTTP server exposing `POST /identify`.

use anyhow::Result;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::types::{HealthResponse, HttpResponse};
use crate::config::Config;
use crate::db::Database;
use crate::reconcile::{
    IdentifyRequest, KeyLocks, Reconciler, ValidationPolicy, GENERIC_FAILURE,
};

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Largest request line plus headers accepted.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Upper bound on bytes discarded after rejecting a request.
const MAX_DRAIN_BYTES: u64 = 1024 * 1024;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Request line and the headers the server cares about.
#[derive(Debug, PartialEq, Eq)]
struct RequestHead {
    method: String,
    path: String,
    content_length: usize,
}

#[derive(Debug, thiserror::Error)]
enum HeadError {
    #[error("malformed request head")]
    Malformed,
    #[error("request head too large")]
    TooLarge,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HeadError {
    fn response(&self) -> HttpResponse {
        match self {
            Self::TooLarge => HttpResponse::error(431, "Request Header Fields Too Large"),
            _ => HttpResponse::error(400, "Bad Request"),
        }
    }
}

/// Read the request line and headers, never buffering more than
/// `MAX_HEAD_BYTES` of them.
fn read_head<R: BufRead>(reader: &mut R) -> Result<RequestHead, HeadError> {
    let mut budget = MAX_HEAD_BYTES;

    let request_line = read_head_line(reader, &mut budget)?.ok_or(HeadError::Malformed)?;
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(HeadError::Malformed);
    }
    let (method, path) = (parts[0].to_string(), parts[1].to_string());

    let mut content_length = 0usize;
    while let Some(line) = read_head_line(reader, &mut budget)? {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().map_err(|_| HeadError::Malformed)?;
            }
        }
    }

    Ok(RequestHead {
        method,
        path,
        content_length,
    })
}

/// One CRLF-terminated line charged against `budget`; `None` at EOF.
fn read_head_line<R: BufRead>(
    reader: &mut R,
    budget: &mut usize,
) -> Result<Option<String>, HeadError> {
    if *budget == 0 {
        return Err(HeadError::TooLarge);
    }
    let mut line = String::new();
    let n = reader.by_ref().take(*budget as u64).read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') {
        return Err(if n == *budget {
            HeadError::TooLarge
        } else {
            HeadError::Malformed
        });
    }
    *budget -= n;
    Ok(Some(line))
}

/// HTTP server for identity reconciliation.
pub struct IdentifyServer {
    db_path: PathBuf,
    policy: ValidationPolicy,
    locks: Arc<KeyLocks>,
    start_time: Instant,
}

impl IdentifyServer {
    /// Create a new server backed by the database in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        // Verify DB is accessible (and migrated) before accepting traffic
        let db = config.open_database()?;
        let existing = db.count_contacts()?;
        tracing::info!(
            db = %config.db_path.display(),
            contacts = existing,
            policy = ?config.validation,
            "contact store ready"
        );

        Ok(Self {
            db_path: config.db_path.clone(),
            policy: config.validation,
            locks: Arc::new(KeyLocks::new()),
            start_time: Instant::now(),
        })
    }

    /// Bind and serve until `shutdown` is set (blocking).
    pub fn start(&self, addr: &str, shutdown: Arc<AtomicBool>) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!("Server is running on {}", listener.local_addr()?);
        self.serve(listener, shutdown)
    }

    /// Accept connections on `listener`, one thread per connection.
    ///
    /// Returns once `shutdown` is set and in-flight requests have finished.
    pub fn serve(&self, listener: TcpListener, shutdown: Arc<AtomicBool>) -> Result<()> {
        listener.set_nonblocking(true)?;

        thread::scope(|scope| {
            while !shutdown.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, peer_addr)) => {
                        scope.spawn(move || {
                            if let Err(e) = self.handle_connection(stream, peer_addr) {
                                tracing::warn!(peer = %peer_addr, "request error: {:#}", e);
                            }
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(50));
                    }
                    Err(e) => {
                        tracing::warn!("accept error: {}", e);
                    }
                }
            }
        });

        tracing::info!("Server stopped");
        Ok(())
    }

    fn handle_connection(&self, mut stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(Duration::from_secs(30)))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let head = match read_head(&mut reader) {
            Ok(head) => head,
            Err(HeadError::Io(e)) => return Err(e.into()),
            Err(e) => {
                let response = e.response();
                tracing::info!(peer = %peer_addr, status = response.status, "rejected request");
                return self.reject(&mut stream, reader, &response);
            }
        };

        let (method, path) = (head.method.as_str(), head.path.as_str());

        if head.content_length > MAX_BODY_BYTES {
            let response = HttpResponse::error(413, "Request body too large");
            tracing::info!(peer = %peer_addr, method, path, status = response.status, "request");
            return self.reject(&mut stream, reader, &response);
        }

        // Read body
        let mut body = vec![0u8; head.content_length];
        if head.content_length > 0 {
            reader.read_exact(&mut body)?;
        }

        let response = self.route(method, path, &body);
        tracing::info!(peer = %peer_addr, method, path, status = response.status, "request");
        self.send(&mut stream, &response)
    }

    /// Answer without consuming the request, then drain what the client
    /// already sent so closing the socket does not reset the connection.
    fn reject(
        &self,
        stream: &mut TcpStream,
        reader: BufReader<TcpStream>,
        response: &HttpResponse,
    ) -> Result<()> {
        self.send(stream, response)?;
        stream.shutdown(Shutdown::Write)?;
        stream.set_read_timeout(Some(DRAIN_TIMEOUT))?;
        // Timeouts and resets here only end the drain early
        let _ = io::copy(&mut reader.take(MAX_DRAIN_BYTES), &mut io::sink());
        Ok(())
    }

    /// Dispatch one parsed request.
    pub fn route(&self, method: &str, path: &str, body: &[u8]) -> HttpResponse {
        let path = path.split('?').next().unwrap_or(path);
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        match (method, path) {
            ("POST", "/identify") => self.handle_identify(body),
            ("GET", "/health") => self.handle_health(),
            (_, "/identify") | (_, "/health") => HttpResponse::error(405, "Method Not Allowed"),
            _ => HttpResponse::error(404, "Not Found"),
        }
    }

    fn handle_identify(&self, body: &[u8]) -> HttpResponse {
        // A missing body reads as an empty request and fails validation below
        let request: IdentifyRequest = if body.iter().all(u8::is_ascii_whitespace) {
            IdentifyRequest::default()
        } else {
            match serde_json::from_slice(body) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("rejecting body: {}", e);
                    return HttpResponse::error(400, "Invalid request body");
                }
            }
        };

        // Reject bad input before touching the store
        if let Err(e) = self.policy.validate(&request) {
            return HttpResponse::error(400, &e.to_string());
        }

        let db = match Database::open_at(&self.db_path) {
            Ok(db) => db,
            Err(e) => {
                tracing::error!("failed to open contact store: {:#}", e);
                return HttpResponse::error(500, GENERIC_FAILURE);
            }
        };

        let reconciler = Reconciler::with_locks(db, self.policy, Arc::clone(&self.locks));
        match reconciler.resolve(&request) {
            Ok(identity) => HttpResponse::json(200, &identity),
            Err(e) if e.is_client_error() => HttpResponse::error(400, &e.public_message()),
            Err(e) => {
                tracing::error!("identify failed: {}", e);
                HttpResponse::error(500, &e.public_message())
            }
        }
    }

    fn handle_health(&self) -> HttpResponse {
        let contacts = Database::open_at(&self.db_path).and_then(|db| db.count_contacts());
        match contacts {
            Ok(contacts) => HttpResponse::json(
                200,
                &HealthResponse {
                    status: "ok".to_string(),
                    uptime_secs: self.start_time.elapsed().as_secs(),
                    contacts,
                },
            ),
            Err(e) => {
                tracing::error!("health check failed: {:#}", e);
                HttpResponse::error(500, GENERIC_FAILURE)
            }
        }
    }

    fn send(&self, stream: &mut TcpStream, response: &HttpResponse) -> Result<()> {
        let raw = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response.status,
            response.status_text(),
            response.body.len(),
            response.body
        );

        stream.write_all(raw.as_bytes())?;
        stream.flush()?;
        Ok(())
    }
}
