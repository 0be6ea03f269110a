//! Remote attestation source.
//!
//! `GET {remote_url}/{subject}` returns a JSON array of envelopes. Transient failures
//! (connection errors, timeouts, 5xx, 429) are retried with exponential backoff. When the
//! source stays unavailable the gate sees zero remote attestations plus a note.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::fmt;
use std::time::Duration;
use trustgate_domain::AttestationSet;
use trustgate_settings::RemoteSettings;
use trustgate_types::{Attestation, AttestationEnvelope, AttestationSource};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// Worth retrying.
    Transient(String),
    /// Retrying will not help.
    Permanent(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transient(m) | FetchError::Permanent(m) => f.write_str(m),
        }
    }
}

impl std::error::Error for FetchError {}

/// Run `attempt` up to `attempts` times (at least once), sleeping `base * 2^n` between
/// transient failures. Permanent failures return immediately.
pub fn fetch_with_retry<T>(
    attempts: u32,
    base: Duration,
    mut attempt: impl FnMut(u32) -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let attempts = attempts.max(1);
    let mut n = 0;
    loop {
        n += 1;
        match attempt(n) {
            Ok(v) => return Ok(v),
            Err(FetchError::Transient(e)) if n < attempts => {
                let delay = base.saturating_mul(1 << (n - 1).min(16));
                tracing::warn!(
                    attempt = n,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "remote fetch failed, retrying"
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RemoteAttestations {
    settings: RemoteSettings,
    backoff: Duration,
}

impl RemoteAttestations {
    pub fn new(settings: RemoteSettings) -> Self {
        Self {
            settings,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetch envelopes for `subject` (a digest or a reference). Never fails: problems become notes.
    pub fn fetch(&self, subject: &str) -> AttestationSet {
        let result = self
            .endpoint(subject)
            .and_then(|url| {
                let client = Client::builder()
                    .timeout(self.settings.timeout)
                    .build()
                    .map_err(|e| FetchError::Permanent(format!("build http client: {e}")))?;
                fetch_with_retry(self.settings.retries, self.backoff, |_| get(&client, &url))
            });

        match result {
            Ok(envelopes) => {
                tracing::debug!(subject, count = envelopes.len(), "remote attestations");
                AttestationSet {
                    attestations: envelopes
                        .into_iter()
                        .enumerate()
                        .map(|(i, envelope)| Attestation {
                            id: format!("remote-{}", i + 1),
                            source: AttestationSource::Remote,
                            envelope,
                        })
                        .collect(),
                    notes: Vec::new(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote attestation source unavailable");
                AttestationSet {
                    attestations: Vec::new(),
                    notes: vec![format!("remote source unavailable: {e}")],
                }
            }
        }
    }

    fn endpoint(&self, subject: &str) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.settings.url)
            .map_err(|e| FetchError::Permanent(format!("invalid remote_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Permanent("remote_url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(subject);
        Ok(url)
    }
}

fn get(client: &Client, url: &reqwest::Url) -> Result<Vec<AttestationEnvelope>, FetchError> {
    let resp = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|e| FetchError::Transient(format!("GET {url}: {e}")))?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::Transient(format!("GET {url}: HTTP {status}")));
    }
    if !status.is_success() {
        return Err(FetchError::Permanent(format!("GET {url}: HTTP {status}")));
    }

    resp.json::<Vec<AttestationEnvelope>>()
        .map_err(|e| FetchError::Permanent(format!("GET {url}: invalid body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve the given raw HTTP responses, one per connection, then stop.
    fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        std::thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/v1")
    }

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn remote(url: String, retries: u32) -> RemoteAttestations {
        RemoteAttestations::new(RemoteSettings {
            url,
            timeout: Duration::from_secs(5),
            retries,
        })
        .with_backoff(Duration::ZERO)
    }

    const ENVELOPE: &str = r#"[{"schema":"trustgate.attestation.v1","payload":{},"keyId":"ed25519:x","publicKey":"AA==","signature":"AA=="}]"#;

    #[test]
    fn retry_stops_on_success() {
        let mut calls = 0;
        let out = fetch_with_retry(3, Duration::ZERO, |n| {
            calls += 1;
            if n < 2 {
                Err(FetchError::Transient("flaky".to_string()))
            } else {
                Ok(n)
            }
        });
        assert_eq!(out, Ok(2));
        assert_eq!(calls, 2);
    }

    #[test]
    fn retry_gives_up_after_attempts() {
        let mut calls = 0;
        let out: Result<(), _> = fetch_with_retry(3, Duration::ZERO, |_| {
            calls += 1;
            Err(FetchError::Transient("down".to_string()))
        });
        assert!(out.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let mut calls = 0;
        let out: Result<(), _> = fetch_with_retry(5, Duration::ZERO, |_| {
            calls += 1;
            Err(FetchError::Permanent("bad request".to_string()))
        });
        assert!(out.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = fetch_with_retry(0, Duration::ZERO, |_| {
            calls += 1;
            Ok::<_, FetchError>(())
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn fetches_envelopes_after_a_server_error() {
        let url = serve(vec![
            response("503 Service Unavailable", ""),
            response("200 OK", ENVELOPE),
        ]);
        let set = remote(url, 3).fetch("sha256:abc");
        assert!(set.notes.is_empty(), "{:?}", set.notes);
        assert_eq!(set.attestations.len(), 1);
        assert_eq!(set.attestations[0].id, "remote-1");
        assert_eq!(set.attestations[0].source, AttestationSource::Remote);
    }

    #[test]
    fn not_found_is_empty_without_note() {
        let url = serve(vec![response("404 Not Found", "")]);
        let set = remote(url, 3).fetch("sha256:abc");
        assert!(set.attestations.is_empty());
        assert!(set.notes.is_empty());
    }

    #[test]
    fn unreachable_source_degrades_to_note() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let set = remote(format!("http://{addr}"), 2).fetch("sha256:abc");
        assert!(set.attestations.is_empty());
        assert_eq!(set.notes.len(), 1);
        assert!(set.notes[0].starts_with("remote source unavailable"));
    }

    #[test]
    fn subject_is_a_single_path_segment() {
        let r = remote("https://attest.example.com/v1/".to_string(), 1);
        let url = r.endpoint("registry.local/app:1.0").expect("url");
        assert_eq!(
            url.as_str(),
            "https://attest.example.com/v1/registry.local%2Fapp:1.0"
        );
    }
}
