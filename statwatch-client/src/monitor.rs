//! The polling loop.
//!
//! A [`Monitor`] owns its statistics source, its output sink and its
//! consecutive-failure counter, so several monitors can run side by side
//! without sharing state.

use std::io::Write;

use anyhow::{Context, Result};
use statwatch_shared::checks::evaluate;
use statwatch_shared::config::MonitorConfig;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetcher::{HttpFetcher, StatsError, StatsSource};

/// Written to the sink once the failure threshold is reached.
pub const UNREACHABLE_MESSAGE: &str = "Unable to fetch server statistic";

#[derive(Debug)]
pub enum CycleOutcome {
    /// Statistics fetched, every check within limits.
    Healthy,
    /// Statistics fetched, the contained report was written to the sink.
    Alerted(String),
    /// Fetch or parse failed. `unreachable` is set when this failure
    /// completed a window and the warning was written.
    Failed { error: StatsError, unreachable: bool },
}

pub struct Monitor<S, W> {
    source: S,
    sink: W,
    config: MonitorConfig,
    failures: u32,
}

impl<S, W> Monitor<S, W>
where
    S: StatsSource,
    W: Write,
{
    pub fn new(source: S, sink: W, config: MonitorConfig) -> Self {
        Self {
            source,
            sink,
            config,
            failures: 0,
        }
    }

    /// Consecutive failures in the current window.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Run a single fetch, parse and evaluate cycle.
    ///
    /// Only sink write failures are returned as errors; fetch and parse
    /// failures are folded into the outcome.
    pub async fn poll_once(&mut self) -> Result<CycleOutcome> {
        match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                self.failures = 0;
                let report = evaluate(&snapshot, &self.config);
                if report.is_empty() {
                    debug!("All metrics within thresholds");
                    return Ok(CycleOutcome::Healthy);
                }

                let text = report.to_string();
                self.emit(&text)?;
                Ok(CycleOutcome::Alerted(text))
            }
            Err(error) => {
                self.failures = self.failures.saturating_add(1);
                debug!(error = %error, failures = self.failures, "Failed to fetch server statistics");

                let unreachable = self.failures >= self.config.failure_count_threshold;
                if unreachable {
                    warn!(failures = self.failures, "Statistics endpoint unreachable");
                    self.emit(&format!("{UNREACHABLE_MESSAGE}\n"))?;
                    self.failures = 0;
                }
                Ok(CycleOutcome::Failed { error, unreachable })
            }
        }
    }

    /// Poll on the configured interval until `shutdown` is cancelled.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> Result<()> {
        let interval = self.config.poll_interval();
        info!(interval_ms = interval.as_millis() as u64, "Starting monitor");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = sleep(interval) => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                outcome = self.poll_once() => {
                    outcome?;
                }
            }
        }

        info!("Monitor stopped");
        Ok(())
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        self.sink
            .write_all(text.as_bytes())
            .and_then(|_| self.sink.flush())
            .context("Failed to write to output")
    }
}

/// CLI: statwatch run
/// Polls the configured endpoint and writes alerts to stdout until shutdown.
pub async fn run(config: Config, shutdown: &CancellationToken) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.endpoint, config.request_timeout())?;
    info!(endpoint = %fetcher.endpoint(), "Monitoring server statistics");

    let mut monitor = Monitor::new(fetcher, std::io::stdout(), config.monitor);
    monitor.run(shutdown).await
}

/// CLI: statwatch check
/// Single cycle; fetch and parse failures are returned instead of counted.
pub async fn check(config: &Config) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.endpoint, config.request_timeout())?;
    let snapshot = fetcher
        .fetch_snapshot()
        .await
        .with_context(|| format!("Failed to fetch statistics from {}", config.endpoint))?;

    let report = evaluate(&snapshot, &config.monitor);
    if report.is_empty() {
        info!("All metrics within thresholds");
    } else {
        print!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use statwatch_shared::metrics::ParseError;

    use super::*;

    const QUIET: &str = "10,1000,100,1000,100,1000,100";
    const BUSY: &str = "35,1000,900,1000,100,1000,100";

    /// Replays canned responses; cancels `done` once they run out.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Option<&'static str>>>,
        calls: AtomicUsize,
        done: Option<CancellationToken>,
    }

    impl ScriptedSource {
        fn new(responses: &[Option<&'static str>]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().copied().collect()),
                calls: AtomicUsize::new(0),
                done: None,
            }
        }

        fn cancelling(mut self, token: CancellationToken) -> Self {
            self.done = Some(token);
            self
        }
    }

    #[async_trait]
    impl StatsSource for ScriptedSource {
        async fn fetch(&self) -> Result<String, StatsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut responses = self.responses.lock().unwrap();
                let next = responses.pop_front();
                if responses.is_empty() {
                    if let Some(token) = &self.done {
                        token.cancel();
                    }
                }
                next
            };
            match next.flatten() {
                Some(body) => Ok(body.to_string()),
                None => Err(StatsError::HttpStatus(StatusCode::BAD_GATEWAY)),
            }
        }
    }

    fn monitor(responses: &[Option<&'static str>]) -> Monitor<ScriptedSource, Vec<u8>> {
        Monitor::new(
            ScriptedSource::new(responses),
            Vec::new(),
            MonitorConfig::default(),
        )
    }

    fn output(monitor: &Monitor<ScriptedSource, Vec<u8>>) -> String {
        String::from_utf8(monitor.sink().clone()).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_cycle_writes_nothing() {
        let mut m = monitor(&[Some(QUIET)]);
        let outcome = m.poll_once().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Healthy));
        assert_eq!(output(&m), "");
        assert_eq!(m.failures(), 0);
    }

    #[tokio::test]
    async fn test_alert_cycle_writes_report() {
        let mut m = monitor(&[Some(BUSY)]);
        let outcome = m.poll_once().await.unwrap();
        let expected = "Load Average is too high: 35\nMemory usage too high: 90%\n";
        match outcome {
            CycleOutcome::Alerted(text) => assert_eq!(text, expected),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(output(&m), expected);
    }

    #[tokio::test]
    async fn test_unreachable_emitted_once_after_three_failures() {
        let mut m = monitor(&[None, None, None, Some(QUIET)]);

        for expected_failures in [1, 2] {
            let outcome = m.poll_once().await.unwrap();
            assert!(matches!(
                outcome,
                CycleOutcome::Failed {
                    unreachable: false,
                    ..
                }
            ));
            assert_eq!(m.failures(), expected_failures);
        }

        let outcome = m.poll_once().await.unwrap();
        assert!(matches!(
            outcome,
            CycleOutcome::Failed {
                unreachable: true,
                ..
            }
        ));
        assert_eq!(m.failures(), 0);

        let outcome = m.poll_once().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Healthy));
        assert_eq!(m.failures(), 0);
        assert_eq!(output(&m), format!("{UNREACHABLE_MESSAGE}\n"));
    }

    #[tokio::test]
    async fn test_fourth_failure_opens_new_window() {
        let mut m = monitor(&[None, None, None, None]);
        for _ in 0..4 {
            m.poll_once().await.unwrap();
        }
        assert_eq!(output(&m).matches(UNREACHABLE_MESSAGE).count(), 1);
        assert_eq!(m.failures(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload_counts_as_failure() {
        let mut m = monitor(&[Some("1,2,3")]);
        match m.poll_once().await.unwrap() {
            CycleOutcome::Failed {
                error: StatsError::Parse(ParseError::FieldCount { found }),
                unreachable,
            } => {
                assert_eq!(found, 3);
                assert!(!unreachable);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(m.failures(), 1);
        assert_eq!(output(&m), "");
    }

    #[tokio::test]
    async fn test_quiet_success_resets_window() {
        let mut m = monitor(&[None, None, Some(QUIET), None, None]);
        for _ in 0..5 {
            m.poll_once().await.unwrap();
        }
        assert_eq!(m.failures(), 2);
        assert_eq!(output(&m), "");
    }

    #[tokio::test]
    async fn test_custom_failure_threshold() {
        let config = MonitorConfig {
            failure_count_threshold: 1,
            ..MonitorConfig::default()
        };
        let mut m = Monitor::new(ScriptedSource::new(&[None, None]), Vec::new(), config);
        m.poll_once().await.unwrap();
        m.poll_once().await.unwrap();
        let out = String::from_utf8(m.into_sink()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_cancelled() {
        let token = CancellationToken::new();
        let source = ScriptedSource::new(&[None, None, None, Some(BUSY), Some(QUIET)])
            .cancelling(token.clone());
        let mut m = Monitor::new(source, Vec::new(), MonitorConfig::default());

        m.run(&token).await.unwrap();

        assert_eq!(m.source.calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            output(&m),
            format!(
                "{UNREACHABLE_MESSAGE}\nLoad Average is too high: 35\nMemory usage too high: 90%\n"
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_poll_interval_between_cycles() {
        let token = CancellationToken::new();
        let source =
            ScriptedSource::new(&[Some(QUIET), Some(QUIET), Some(QUIET)]).cancelling(token.clone());
        let mut m = Monitor::new(source, Vec::new(), MonitorConfig::default());

        let start = tokio::time::Instant::now();
        m.run(&token).await.unwrap();
        assert!(start.elapsed() >= MonitorConfig::default().poll_interval() * 3);
    }

    #[tokio::test]
    async fn test_run_returns_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let mut m = monitor(&[Some(BUSY)]);
        m.run(&token).await.unwrap();
        assert_eq!(m.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(output(&m), "");
    }
}
