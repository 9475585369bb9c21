//! Scheduled polling
//!
//! A [`PollingDriver`] owns one worker thread that runs [`Engine::poll_once`]
//! immediately and then once per interval. Manual triggers run an extra
//! cycle without moving the schedule. Cycles never overlap: the worker waits
//! for a cycle to finish before computing the next deadline, and the engine
//! mutex serializes the worker with any other caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Trigger,
    Stop,
}

/// Runs poll cycles on a background thread
#[derive(Debug)]
pub struct PollingDriver {
    commands: Sender<Command>,
    handle: Option<JoinHandle<()>>,
    cycles: Arc<AtomicUsize>,
}

impl PollingDriver {
    /// Start polling. The first cycle runs right away.
    pub fn spawn(engine: Arc<Mutex<Engine>>, interval: Duration) -> Self {
        let (commands, rx) = mpsc::channel();
        let cycles = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cycles);

        let handle = thread::spawn(move || {
            log::debug!("Polling every {}s", interval.as_secs());
            let mut next_due = Instant::now();
            loop {
                let wait = next_due.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(Command::Trigger) => {
                        log::debug!("Manual poll requested");
                        run_cycle(&engine, &counter);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        run_cycle(&engine, &counter);
                        next_due = Instant::now() + interval;
                    }
                    Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::debug!("Polling stopped");
        });

        Self {
            commands,
            handle: Some(handle),
            cycles,
        }
    }

    /// Request one extra cycle now; the next scheduled cycle is unchanged.
    pub fn trigger(&self) {
        if self.commands.send(Command::Trigger).is_err() {
            log::debug!("Trigger ignored, driver already stopped");
        }
    }

    /// Completed cycles, failed ones included
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Stop polling. A cycle already running is allowed to finish.
    pub fn stop(&mut self) {
        let _ = self.commands.send(Command::Stop);
        self.join();
    }

    /// Block until the worker exits. Without a `stop` this runs until the
    /// process is terminated.
    pub fn wait(&mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Polling thread panicked");
        }
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_cycle(engine: &Mutex<Engine>, cycles: &AtomicUsize) {
    let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
    // Failures are logged by the engine; the schedule continues
    let _ = engine.poll_once();
    cycles.fetch_add(1, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, family};
    use graphql::{MockTransport, Reply};
    use reconcile::MemoryStore;
    use serde_json::json;

    fn shared_engine(transport: &MockTransport, store: &MemoryStore) -> Arc<Mutex<Engine>> {
        let catalog = catalog::unraid().unwrap();
        let selection = catalog.resolve_selection(["info"]);
        Arc::new(Mutex::new(Engine::new(
            catalog,
            family::all(),
            Box::new(transport.clone()),
            Box::new(store.clone()),
            selection,
        )))
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn test_first_cycle_runs_immediately() {
        let transport = MockTransport::always(json!({"info": {"time": "t1"}}));
        let store = MemoryStore::new();
        let mut driver = PollingDriver::spawn(shared_engine(&transport, &store), Duration::from_secs(3600));

        assert!(wait_for(|| driver.cycles() >= 1));
        assert_eq!(store.value("info.time"), Some(json!("t1")));
        driver.stop();
        assert_eq!(transport.queries().len(), 1);
    }

    #[test]
    fn test_trigger_runs_extra_cycle() {
        let transport = MockTransport::always(json!({"info": {"time": "t"}}));
        let store = MemoryStore::new();
        let mut driver = PollingDriver::spawn(shared_engine(&transport, &store), Duration::from_secs(3600));
        assert!(wait_for(|| driver.cycles() >= 1));

        driver.trigger();
        driver.trigger();
        assert!(wait_for(|| driver.cycles() >= 3));
        driver.stop();
        assert_eq!(transport.queries().len(), 3);
    }

    #[test]
    fn test_interval_schedules_cycles() {
        let transport = MockTransport::always(json!({"info": {"time": "t"}}));
        let store = MemoryStore::new();
        let mut driver = PollingDriver::spawn(shared_engine(&transport, &store), Duration::from_millis(20));

        assert!(wait_for(|| driver.cycles() >= 3));
        driver.stop();
    }

    #[test]
    fn test_failed_cycle_keeps_polling() {
        let transport = MockTransport::new();
        transport.push_failure("timeout");
        transport.set_fallback(Reply::Data(json!({"info": {"time": "later"}})));
        let store = MemoryStore::new();
        let mut driver = PollingDriver::spawn(shared_engine(&transport, &store), Duration::from_secs(3600));

        assert!(wait_for(|| driver.cycles() >= 1));
        assert!(store.is_empty());

        driver.trigger();
        assert!(wait_for(|| driver.cycles() >= 2));
        driver.stop();
        assert_eq!(store.value("info.time"), Some(json!("later")));
    }

    #[test]
    fn test_stop_prevents_further_cycles() {
        let transport = MockTransport::always(json!({"info": {"time": "t"}}));
        let store = MemoryStore::new();
        let mut driver = PollingDriver::spawn(shared_engine(&transport, &store), Duration::from_secs(3600));
        assert!(wait_for(|| driver.cycles() >= 1));

        driver.stop();
        let after_stop = driver.cycles();
        driver.trigger();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(driver.cycles(), after_stop);
    }

    #[test]
    fn test_manual_poll_shares_engine() {
        let transport = MockTransport::always(json!({"info": {"time": "t"}}));
        let store = MemoryStore::new();
        let engine = shared_engine(&transport, &store);
        let mut driver = PollingDriver::spawn(Arc::clone(&engine), Duration::from_secs(3600));
        assert!(wait_for(|| driver.cycles() >= 1));

        engine.lock().unwrap().poll_once().unwrap();
        driver.stop();
        assert_eq!(transport.queries().len(), 2);
    }
}
