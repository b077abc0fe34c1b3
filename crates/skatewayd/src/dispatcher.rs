//! The dispatch loop.
//!
//! On a fixed cadence, one full pass over the site registry: fabricate a
//! reading, attach the site, then either print it (dry-run) or publish it
//! through that site's channel. Strictly sequential; one site's send
//! completes or fails before the next is attempted. A shutdown signal is
//! honored at the start of each cycle and before each per-site send.

use std::time::Duration;

use skateway_common::TelemetryGenerator;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::SiteRegistry;
use crate::publisher::{HttpPublisher, NullPublisher, SitePublisher};

/// Default cadence between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Execution mode for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    DryRun,
}

/// Loop lifecycle. `Stopping` is terminal: connections are released and the
/// loop returns. There are no other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopping,
}

/// One site's exclusive connection handle, owned by the loop.
pub struct SiteChannel {
    pub site: String,
    pub publisher: Box<dyn SitePublisher>,
}

/// Outcome of one full pass over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub published: usize,
    pub printed: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    channels: Vec<SiteChannel>,
    mode: Mode,
    interval: Duration,
    generator: TelemetryGenerator,
}

impl Dispatcher {
    pub fn new(channels: Vec<SiteChannel>, mode: Mode, interval: Duration) -> Self {
        Self {
            channels,
            mode,
            interval,
            generator: TelemetryGenerator::new(),
        }
    }

    /// Acquire a channel per registry site. Live sites get an HTTP
    /// publisher built from their credential; dry-run sites get an inert
    /// one, since nothing is ever sent.
    pub fn from_registry(registry: &SiteRegistry, mode: Mode, interval: Duration) -> Self {
        let channels = registry
            .sites()
            .iter()
            .map(|site| {
                let publisher: Box<dyn SitePublisher> = match (&mode, &site.credential) {
                    (Mode::Live, Some(credential)) => {
                        Box::new(HttpPublisher::connect(&site.name, credential))
                    }
                    _ => Box::new(NullPublisher),
                };
                SiteChannel {
                    site: site.name.clone(),
                    publisher,
                }
            })
            .collect();

        Self::new(channels, mode, interval)
    }

    /// Swap in a deterministic generator for tests.
    pub fn with_generator(mut self, generator: TelemetryGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// One full pass over the registry, in stable order. Publish failures
    /// are logged with the site identifier and do not stop the pass; there
    /// is no immediate retry.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();

        for channel in &self.channels {
            if *shutdown.borrow() {
                debug!("Shutdown requested mid-cycle; skipping remaining sites");
                break;
            }

            let mut reading = self.generator.generate();
            reading.location = channel.site.clone();

            match self.mode {
                Mode::DryRun => {
                    // The printed line is the exact wire payload.
                    let payload = serde_json::to_string(&reading).unwrap_or_default();
                    println!("[dry-run] {}", payload);
                    report.printed += 1;
                }
                Mode::Live => match channel.publisher.publish(&reading).await {
                    Ok(()) => {
                        info!("Sent reading for '{}' at {}", channel.site, reading.timestamp);
                        report.published += 1;
                    }
                    Err(e) => {
                        error!("{}; will retry on next cycle", e);
                        report.failed += 1;
                    }
                },
            }
        }

        report
    }

    /// Run until the shutdown signal fires, then release every connection
    /// and return. The inter-cycle sleep races the signal; nothing else can
    /// cut it short.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Dispatch loop started: {} sites every {}s ({})",
            self.channels.len(),
            self.interval.as_secs_f64(),
            match self.mode {
                Mode::Live => "live",
                Mode::DryRun => "dry-run",
            }
        );

        let mut state = LoopState::Running;
        while state == LoopState::Running {
            if *shutdown.borrow() {
                state = LoopState::Stopping;
                continue;
            }

            let report = self.run_cycle(&shutdown).await;
            debug!(
                "Cycle complete: {} published, {} printed, {} failed",
                report.published, report.printed, report.failed
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    state = LoopState::Stopping;
                }
            }
        }

        info!("Stopped sending telemetry");
        self.teardown().await;
    }

    /// Release every channel exactly once.
    async fn teardown(&mut self) {
        for channel in self.channels.drain(..) {
            channel.publisher.disconnect().await;
        }
        info!("All site connections released");
    }
}
