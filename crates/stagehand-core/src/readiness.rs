use crate::error::{Result, StagehandError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// PollSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub url: String,
    pub max_attempts: u32,
    /// Sleep between failed attempts. Never applied after the last one.
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Ready { body: String },
    /// Not ready yet, with the reason (status code or transport error).
    NotReady(String),
}

pub trait Probe {
    fn target(&self) -> &str;
    fn probe(&self) -> ProbeOutcome;
}

/// GET `url` and succeed only on HTTP 200.
pub struct HttpProbe {
    url: String,
    http: Client,
}

impl HttpProbe {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| StagehandError::InvalidConfig(format!("health url '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StagehandError::InvalidConfig(format!(
                "health url '{url}' must use http or https"
            )));
        }
        if request_timeout.is_zero() {
            return Err(StagehandError::InvalidConfig(
                "probe request timeout must be greater than 0".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StagehandError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }
}

impl Probe for HttpProbe {
    fn target(&self) -> &str {
        &self.url
    }

    fn probe(&self) -> ProbeOutcome {
        let resp = match self.http.get(&self.url).send() {
            Ok(r) => r,
            Err(e) => return ProbeOutcome::NotReady(e.to_string()),
        };
        let status = resp.status();
        if status != StatusCode::OK {
            return ProbeOutcome::NotReady(format!("HTTP {}", status.as_u16()));
        }
        match resp.text() {
            Ok(body) => ProbeOutcome::Ready { body },
            Err(e) => ProbeOutcome::NotReady(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// wait_until_ready
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Ready {
    pub url: String,
    /// 1-indexed attempt that succeeded.
    pub attempts: u32,
    pub body: String,
}

/// Probe until the first success or until `max_attempts` probes have failed.
///
/// Failed probes are not errors; only the last failure reason is kept and
/// reported in `TimedOut`. `sleep` runs between attempts, so a full timeout
/// sleeps `max_attempts - 1` times.
pub fn wait_until_ready<P: Probe>(
    probe: &P,
    max_attempts: u32,
    interval: Duration,
    sleep: &mut dyn FnMut(Duration),
) -> Result<Ready> {
    if max_attempts == 0 {
        return Err(StagehandError::InvalidConfig(
            "readiness max_attempts must be at least 1".to_string(),
        ));
    }

    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match probe.probe() {
            ProbeOutcome::Ready { body } => {
                tracing::info!(url = probe.target(), attempt, "service is ready");
                return Ok(Ready {
                    url: probe.target().to_string(),
                    attempts: attempt,
                    body,
                });
            }
            ProbeOutcome::NotReady(reason) => {
                tracing::debug!(url = probe.target(), attempt, %reason, "not ready");
                last_error = Some(reason);
            }
        }
        if attempt < max_attempts {
            sleep(interval);
        }
    }

    Err(StagehandError::TimedOut {
        url: probe.target().to_string(),
        attempts: max_attempts,
        last_error,
    })
}

/// Block the current thread until `settings.url` answers 200.
pub fn wait_for(settings: &PollSettings) -> Result<Ready> {
    let probe = HttpProbe::new(&settings.url, settings.request_timeout)?;
    wait_until_ready(
        &probe,
        settings.max_attempts,
        settings.interval,
        &mut std::thread::sleep,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedProbe {
        outcomes: RefCell<Vec<ProbeOutcome>>,
        calls: RefCell<u32>,
    }

    impl ScriptedProbe {
        /// Replays `outcomes` in order, then reports not-ready forever.
        fn new(outcomes: Vec<ProbeOutcome>) -> Self {
            let mut outcomes = outcomes;
            outcomes.reverse();
            Self {
                outcomes: RefCell::new(outcomes),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl Probe for ScriptedProbe {
        fn target(&self) -> &str {
            "http://scripted/"
        }

        fn probe(&self) -> ProbeOutcome {
            *self.calls.borrow_mut() += 1;
            self.outcomes
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| ProbeOutcome::NotReady("connection refused".to_string()))
        }
    }

    fn ready(body: &str) -> ProbeOutcome {
        ProbeOutcome::Ready {
            body: body.to_string(),
        }
    }

    #[test]
    fn first_attempt_success_never_sleeps() {
        let probe = ScriptedProbe::new(vec![ready("ok")]);
        let mut sleeps = Vec::new();

        let r = wait_until_ready(&probe, 60, DEFAULT_INTERVAL, &mut |d| sleeps.push(d)).unwrap();

        assert_eq!(r.attempts, 1);
        assert_eq!(r.body, "ok");
        assert!(sleeps.is_empty());
        assert_eq!(probe.calls(), 1);
    }

    #[test]
    fn stops_at_first_success() {
        let probe = ScriptedProbe::new(vec![
            ProbeOutcome::NotReady("HTTP 503".to_string()),
            ProbeOutcome::NotReady("connection refused".to_string()),
            ready("{\"status\":\"ok\"}"),
            ready("never reached"),
        ]);
        let mut sleeps = Vec::new();

        let r = wait_until_ready(&probe, 60, DEFAULT_INTERVAL, &mut |d| sleeps.push(d)).unwrap();

        assert_eq!(r.attempts, 3);
        assert_eq!(probe.calls(), 3);
        assert_eq!(sleeps, vec![DEFAULT_INTERVAL, DEFAULT_INTERVAL]);
    }

    #[test]
    fn times_out_after_budget_with_last_error() {
        let probe = ScriptedProbe::new(vec![ProbeOutcome::NotReady("HTTP 502".to_string())]);
        let mut slept = Duration::ZERO;
        let mut sleeps = 0;

        let err = wait_until_ready(&probe, 60, DEFAULT_INTERVAL, &mut |d| {
            slept += d;
            sleeps += 1;
        })
        .unwrap_err();

        assert_eq!(probe.calls(), 60);
        assert_eq!(sleeps, 59);
        assert!(slept >= DEFAULT_INTERVAL * 59);
        match err {
            StagehandError::TimedOut {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 60);
                assert_eq!(last_error.as_deref(), Some("connection refused"));
            }
            other => panic!("expected TimedOut, got {other:?}"),
        }
    }

    #[test]
    fn zero_attempts_is_config_error() {
        let probe = ScriptedProbe::new(vec![ready("ok")]);
        let err = wait_until_ready(&probe, 0, DEFAULT_INTERVAL, &mut |_| {}).unwrap_err();
        assert!(matches!(err, StagehandError::InvalidConfig(_)));
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn invalid_url_is_config_error() {
        assert!(matches!(
            HttpProbe::new("not a url", DEFAULT_REQUEST_TIMEOUT),
            Err(StagehandError::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpProbe::new("ftp://127.0.0.1/", DEFAULT_REQUEST_TIMEOUT),
            Err(StagehandError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_request_timeout_is_config_error() {
        assert!(matches!(
            HttpProbe::new("http://127.0.0.1:8000/", Duration::ZERO),
            Err(StagehandError::InvalidConfig(_))
        ));
    }

    #[test]
    fn wait_for_rejects_zero_request_timeout_before_polling() {
        let settings = PollSettings {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            wait_for(&settings),
            Err(StagehandError::InvalidConfig(_))
        ));
    }

    #[test]
    fn http_probe_requires_200() {
        let mut server = mockito::Server::new();
        let _m = server.mock("GET", "/").with_status(204).create();

        let probe = HttpProbe::new(&server.url(), DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(probe.probe(), ProbeOutcome::NotReady("HTTP 204".to_string()));
    }

    #[test]
    fn http_probe_returns_body() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("alive")
            .create();

        let probe =
            HttpProbe::new(&format!("{}/health", server.url()), DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(probe.probe(), ready("alive"));
    }

    #[test]
    fn http_probe_connection_refused_is_not_ready() {
        let probe = HttpProbe::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        assert!(matches!(probe.probe(), ProbeOutcome::NotReady(_)));
    }

    #[test]
    fn wait_for_polls_real_server() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("hello")
            .expect(1)
            .create();

        let settings = PollSettings {
            url: format!("{}/", server.url()),
            max_attempts: 3,
            interval: Duration::from_millis(10),
            request_timeout: Duration::from_secs(2),
        };
        let r = wait_for(&settings).unwrap();
        assert_eq!(r.attempts, 1);
        assert_eq!(r.body, "hello");
        m.assert();
    }

    #[test]
    fn wait_for_times_out_on_persistent_errors() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/")
            .with_status(503)
            .expect(3)
            .create();

        let settings = PollSettings {
            url: format!("{}/", server.url()),
            max_attempts: 3,
            interval: Duration::from_millis(10),
            request_timeout: Duration::from_secs(2),
        };
        let err = wait_for(&settings).unwrap_err();
        match err {
            StagehandError::TimedOut { last_error, .. } => {
                assert_eq!(last_error.as_deref(), Some("HTTP 503"));
            }
            other => panic!("expected TimedOut, got {other:?}"),
        }
        m.assert();
    }
}
