//! Dispatch loop behavior tests.
//!
//! Exercises the loop against recording fakes: per-site publish counts,
//! dry-run isolation, failure containment, and shutdown cleanup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use skateway_common::{
    PublishError, Reading, TelemetryGenerator, EXTERNAL_TEMPERATURE_C, ICE_THICKNESS_CM,
    SNOW_ACCUMULATION_CM, SURFACE_TEMPERATURE_C,
};
use skatewayd::dispatcher::{CycleReport, Dispatcher, Mode, SiteChannel};
use skatewayd::publisher::SitePublisher;
use tokio::sync::watch;

// ============================================================================
// Test doubles
// ============================================================================

/// Records every publish into a ledger shared across sites, counts
/// disconnects, and optionally fails every publish.
struct RecordingPublisher {
    site: String,
    ledger: Arc<Mutex<Vec<Reading>>>,
    disconnects: Arc<AtomicUsize>,
    fail: bool,
    /// When set, flips the shutdown signal once the shared ledger reaches
    /// this many entries. Lets tests stop the full loop deterministically.
    stop_after_total: Option<(usize, Arc<watch::Sender<bool>>)>,
}

#[async_trait]
impl SitePublisher for RecordingPublisher {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::new(&self.site, "simulated outage"));
        }

        let total = {
            let mut ledger = self.ledger.lock().unwrap();
            ledger.push(reading.clone());
            ledger.len()
        };

        if let Some((limit, tx)) = &self.stop_after_total {
            if total >= *limit {
                let _ = tx.send(true);
            }
        }

        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    ledger: Arc<Mutex<Vec<Reading>>>,
    disconnects: Vec<Arc<AtomicUsize>>,
    channels: Vec<SiteChannel>,
}

fn harness(sites: &[(&str, bool)], stop_after: Option<(usize, Arc<watch::Sender<bool>>)>) -> Harness {
    let ledger = Arc::new(Mutex::new(Vec::new()));
    let mut disconnects = Vec::new();
    let mut channels = Vec::new();

    for &(site, fail) in sites {
        let counter = Arc::new(AtomicUsize::new(0));
        disconnects.push(counter.clone());
        channels.push(SiteChannel {
            site: site.to_string(),
            publisher: Box::new(RecordingPublisher {
                site: site.to_string(),
                ledger: ledger.clone(),
                disconnects: counter,
                fail,
                stop_after_total: stop_after.clone(),
            }),
        });
    }

    Harness {
        ledger,
        disconnects,
        channels,
    }
}

fn assert_in_bounds(reading: &Reading) {
    assert!((SURFACE_TEMPERATURE_C.0..=SURFACE_TEMPERATURE_C.1)
        .contains(&reading.surface_temperature));
    assert!((EXTERNAL_TEMPERATURE_C.0..=EXTERNAL_TEMPERATURE_C.1)
        .contains(&reading.external_temperature));
    assert!((ICE_THICKNESS_CM.0..=ICE_THICKNESS_CM.1).contains(&reading.ice_thickness));
    assert!((SNOW_ACCUMULATION_CM.0..=SNOW_ACCUMULATION_CM.1).contains(&reading.snow_accumulation));
}

// ============================================================================
// Cycle behavior
// ============================================================================

#[tokio::test]
async fn test_two_sites_two_cycles_publish_four_readings() {
    let h = harness(&[("Dow's Lake", false), ("NAC", false)], None);
    let mut dispatcher = Dispatcher::new(h.channels, Mode::Live, Duration::ZERO)
        .with_generator(TelemetryGenerator::with_seed(11));
    let (_tx, rx) = watch::channel(false);

    for _ in 0..2 {
        let report = dispatcher.run_cycle(&rx).await;
        assert_eq!(
            report,
            CycleReport {
                published: 2,
                printed: 0,
                failed: 0
            }
        );
    }

    let ledger = h.ledger.lock().unwrap();
    assert_eq!(ledger.len(), 4);
    // Stable registry order within each cycle, location equal to the key.
    let locations: Vec<&str> = ledger.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["Dow's Lake", "NAC", "Dow's Lake", "NAC"]);
    for reading in ledger.iter() {
        assert_in_bounds(reading);
    }
}

#[tokio::test]
async fn test_dry_run_never_touches_the_publish_interface() {
    let h = harness(&[("Dow's Lake", false), ("NAC", false)], None);
    let mut dispatcher = Dispatcher::new(h.channels, Mode::DryRun, Duration::ZERO);
    let (_tx, rx) = watch::channel(false);

    let report = dispatcher.run_cycle(&rx).await;

    assert_eq!(report.printed, 2, "one printed reading per site per cycle");
    assert_eq!(report.published, 0);
    assert!(h.ledger.lock().unwrap().is_empty(), "publish was invoked in dry-run");
}

#[tokio::test]
async fn test_one_failing_site_does_not_stop_the_cycle() {
    let h = harness(
        &[("Dow's Lake", true), ("NAC", false), ("Fifth Avenue", false)],
        None,
    );
    let mut dispatcher = Dispatcher::new(h.channels, Mode::Live, Duration::ZERO);
    let (_tx, rx) = watch::channel(false);

    let report = dispatcher.run_cycle(&rx).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 2, "remaining sites still published");

    // The failing site gets its normal attempt again on the next cycle.
    let report = dispatcher.run_cycle(&rx).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 2);

    let locations: Vec<String> = h
        .ledger
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.location.clone())
        .collect();
    assert_eq!(locations, vec!["NAC", "Fifth Avenue", "NAC", "Fifth Avenue"]);
}

// ============================================================================
// Shutdown behavior
// ============================================================================

#[tokio::test]
async fn test_shutdown_before_start_sends_nothing_and_disconnects_once() {
    let h = harness(&[("Dow's Lake", false), ("NAC", false)], None);
    let dispatcher = Dispatcher::new(h.channels, Mode::Live, Duration::from_secs(10));
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    dispatcher.run(rx).await;

    assert!(h.ledger.lock().unwrap().is_empty());
    for counter in &h.disconnects {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_shutdown_mid_cycle_skips_remaining_sites() {
    let h = harness(&[("Dow's Lake", false), ("NAC", false)], None);
    let mut dispatcher = Dispatcher::new(h.channels, Mode::Live, Duration::ZERO);
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let report = dispatcher.run_cycle(&rx).await;
    assert_eq!(report, CycleReport::default());
    assert!(h.ledger.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_full_loop_runs_cycles_then_cleans_up_on_signal() {
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);

    // The shutdown signal flips once four readings have been recorded, so
    // the loop stops right after the second full cycle.
    let h = harness(
        &[("Dow's Lake", false), ("NAC", false)],
        Some((4, tx.clone())),
    );
    let dispatcher = Dispatcher::new(h.channels, Mode::Live, Duration::ZERO)
        .with_generator(TelemetryGenerator::with_seed(5));

    dispatcher.run(rx).await;

    let ledger = h.ledger.lock().unwrap();
    assert_eq!(ledger.len(), 4, "two sites, two cycles");
    for reading in ledger.iter() {
        assert_in_bounds(reading);
    }
    for counter in &h.disconnects {
        assert_eq!(counter.load(Ordering::SeqCst), 1, "disconnect exactly once");
    }
}
