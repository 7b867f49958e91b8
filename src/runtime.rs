//! Session runtime: the fixed-interval tick loop.
//!
//! While running, the [`Session`] is moved onto a dedicated worker thread
//! that multiplexes timer ticks and control messages with `select!`. Every
//! mutation therefore happens on one thread, one message at a time. Control
//! calls wait for an acknowledgement, so a parameter change has been applied
//! (and the new factor computed) by the time they return `Ok`. An `Err`
//! means the change was not and will not be applied.
//!
//! After every mutation the worker publishes a [`SimulationSnapshot`] into a
//! shared [`SnapshotCell`]. Presenters only ever read from that cell.
//!
//! State machine: `Idle` (session held by the runtime, no timer) and
//! `Running` (session owned by the worker). Stopping is idempotent, drops
//! the timer with the worker, and joins the thread; `Drop` stops as well.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{
    bounded, select, tick, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};

use crate::config::SimulationConfig;
use crate::error::{ExecutionError, GargantuaError, GargantuaResult, ValidationError};
use crate::session::{ControlEvent, Session, SimulationSnapshot};

const CONTROL_PATH: &str = "session_control";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum queued control messages.
    pub control_queue_capacity: usize,
    /// How long a control call waits for the worker to pick up its event.
    /// Must be non-zero.
    pub ack_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            control_queue_capacity: 64,
            ack_timeout: Duration::from_secs(1),
        }
    }
}

impl RuntimeConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.control_queue_capacity == 0 {
            return Err(ValidationError::ZeroCapacity {
                queue: CONTROL_PATH.to_string(),
            });
        }
        if self.ack_timeout.is_zero() {
            return Err(ValidationError::ZeroAckTimeout);
        }
        Ok(())
    }
}

/// Tick loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    /// No tick loop running.
    Idle,
    /// Tick loop active.
    Running,
}

/// What [`SessionRuntime::stop`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop was not running.
    AlreadyIdle,
    /// The worker exited and handed the session back.
    Stopped,
    /// The worker panicked. The session was rebuilt from the last published
    /// snapshot, which every mutation refreshes, so identity, parameters
    /// and clocks carry over.
    Recovered {
        /// Tick count of the rebuilt session.
        ticks: u64,
    },
}

/// Latest published snapshot plus a change counter.
///
/// Readers copy the snapshot out; they never hold a reference into session
/// state.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<SimulationSnapshot>,
    version: AtomicU64,
}

impl SnapshotCell {
    /// Cell holding `initial` at version 0.
    #[must_use]
    pub fn new(initial: SimulationSnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
            version: AtomicU64::new(0),
        }
    }

    /// Copies out the latest snapshot.
    #[must_use]
    pub fn load(&self) -> SimulationSnapshot {
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Number of publications so far; changes whenever the snapshot does.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn publish(&self, snapshot: SimulationSnapshot) {
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        self.version.fetch_add(1, Ordering::Release);
    }
}

/// Claim on a queued control event. Whichever side moves it out of
/// `PENDING` first decides the outcome: the worker applies it, or the
/// caller cancels it after a timeout.
#[derive(Debug, Clone)]
struct Ticket(Arc<AtomicU8>);

impl Ticket {
    const PENDING: u8 = 0;
    const CLAIMED: u8 = 1;
    const CANCELLED: u8 = 2;

    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(Self::PENDING)))
    }

    fn settle(&self, to: u8) -> bool {
        self.0
            .compare_exchange(Self::PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn claim(&self) -> bool {
        self.settle(Self::CLAIMED)
    }

    fn cancel(&self) -> bool {
        self.settle(Self::CANCELLED)
    }
}

enum ControlMsg {
    Apply {
        event: ControlEvent,
        ticket: Ticket,
        reply: Sender<SimulationSnapshot>,
    },
    Shutdown,
}

struct Worker {
    control_tx: Sender<ControlMsg>,
    join: JoinHandle<Session>,
}

enum Slot {
    Idle(Session),
    Running(Worker),
    /// Only observable between `into_session` and `Drop`.
    Vacant,
}

/// Owns one session and drives its clocks on a fixed real-time tick.
pub struct SessionRuntime {
    config: RuntimeConfig,
    sim_config: SimulationConfig,
    started_at: DateTime<Utc>,
    slot: Slot,
    snapshots: Arc<SnapshotCell>,
}

impl SessionRuntime {
    /// Creates an idle runtime around a fresh session.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if either configuration is invalid.
    pub fn new(sim_config: SimulationConfig, config: RuntimeConfig) -> GargantuaResult<Self> {
        sim_config.validate()?;
        Self::with_session(Session::new(sim_config), config)
    }

    /// Creates an idle runtime around an existing session.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the runtime configuration is invalid.
    pub fn with_session(session: Session, config: RuntimeConfig) -> GargantuaResult<Self> {
        config.validate()?;
        let snapshots = Arc::new(SnapshotCell::new(session.snapshot()));
        Ok(Self {
            config,
            sim_config: session.config().clone(),
            started_at: session.started_at(),
            slot: Slot::Idle(session),
            snapshots,
        })
    }

    /// Current state of the tick loop.
    #[must_use]
    pub const fn state(&self) -> RuntimeState {
        match self.slot {
            Slot::Running(_) => RuntimeState::Running,
            Slot::Idle(_) | Slot::Vacant => RuntimeState::Idle,
        }
    }

    /// Shared handle to the published snapshots, for presenters.
    #[must_use]
    pub fn snapshots(&self) -> Arc<SnapshotCell> {
        Arc::clone(&self.snapshots)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        self.snapshots.load()
    }

    /// Starts the tick loop.
    ///
    /// Starting a running runtime re-initializes the loop: the old worker
    /// and its timer are torn down first, then a new one is spawned for the
    /// same session. Clocks are preserved.
    pub fn start(&mut self) {
        self.stop();
        let Slot::Idle(session) = std::mem::replace(&mut self.slot, Slot::Vacant) else {
            return;
        };

        let interval = session.config().tick_interval();
        let session_id = session.id();
        let (control_tx, control_rx) = bounded::<ControlMsg>(self.config.control_queue_capacity);
        let snapshots = Arc::clone(&self.snapshots);

        let join = thread::Builder::new()
            .name("gargantua-tick".to_string())
            .spawn(move || worker_loop(session, interval, control_rx, snapshots))
            .expect("failed to spawn gargantua tick worker");

        tracing::info!(
            session = %session_id,
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "tick loop started"
        );
        self.slot = Slot::Running(Worker { control_tx, join });
    }

    /// Stops the tick loop. Idempotent.
    ///
    /// Returns once the worker has exited; no tick is applied after this
    /// returns.
    pub fn stop(&mut self) -> StopOutcome {
        if !matches!(self.slot, Slot::Running(_)) {
            return StopOutcome::AlreadyIdle;
        }
        let Slot::Running(worker) = std::mem::replace(&mut self.slot, Slot::Vacant) else {
            return StopOutcome::AlreadyIdle;
        };

        let Worker { control_tx, join } = worker;
        // Ask politely, then disconnect: either one ends the loop.
        let _ = control_tx.try_send(ControlMsg::Shutdown);
        drop(control_tx);

        match join.join() {
            Ok(session) => {
                tracing::info!(session = %session.id(), ticks = session.ticks(), "tick loop stopped");
                self.snapshots.publish(session.snapshot());
                self.slot = Slot::Idle(session);
                StopOutcome::Stopped
            }
            Err(_) => {
                let last = self.snapshots.load();
                tracing::error!(
                    session = %last.session_id,
                    ticks = last.ticks,
                    "tick worker panicked; restoring session from last snapshot"
                );
                let session = Session::restore(self.sim_config.clone(), self.started_at, &last);
                self.snapshots.publish(session.snapshot());
                self.slot = Slot::Idle(session);
                StopOutcome::Recovered { ticks: last.ticks }
            }
        }
    }

    /// Applies a control event and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// While running, returns `ExecutionError::QueueFull` if the control
    /// queue is saturated, `Timeout` if the worker does not pick the event up
    /// within `ack_timeout`, and `Disconnected` if the worker is gone. In
    /// every error case the event is discarded and the published snapshot is
    /// left as it was.
    pub fn apply(&mut self, event: ControlEvent) -> GargantuaResult<SimulationSnapshot> {
        match &mut self.slot {
            Slot::Idle(session) => {
                session.apply(event);
                let snapshot = session.snapshot();
                self.snapshots.publish(snapshot);
                Ok(snapshot)
            }
            Slot::Running(worker) => {
                let ticket = Ticket::new();
                let (reply_tx, reply_rx) = bounded::<SimulationSnapshot>(1);
                match worker.control_tx.try_send(ControlMsg::Apply {
                    event,
                    ticket: ticket.clone(),
                    reply: reply_tx,
                }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        return Err(GargantuaError::Execution(ExecutionError::QueueFull {
                            path: CONTROL_PATH.to_string(),
                            capacity: self.config.control_queue_capacity,
                        }))
                    }
                    Err(TrySendError::Disconnected(_)) => return Err(disconnected()),
                }
                let timeout = self.config.ack_timeout;
                match reply_rx.recv_timeout(timeout) {
                    Ok(snapshot) => Ok(snapshot),
                    Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
                    Err(RecvTimeoutError::Timeout) => {
                        if ticket.cancel() {
                            tracing::warn!(?event, ?timeout, "control event cancelled");
                            return Err(GargantuaError::Execution(ExecutionError::Timeout {
                                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                            }));
                        }
                        // The worker claimed it first; its reply is on the way.
                        reply_rx.recv().map_err(|_| disconnected())
                    }
                }
            }
            Slot::Vacant => Err(disconnected()),
        }
    }

    /// Sets the black-hole mass (clamped).
    ///
    /// # Errors
    ///
    /// See [`SessionRuntime::apply`].
    pub fn set_mass(&mut self, mass: f64) -> GargantuaResult<SimulationSnapshot> {
        self.apply(ControlEvent::SetMass(mass))
    }

    /// Sets the orbital distance (clamped).
    ///
    /// # Errors
    ///
    /// See [`SessionRuntime::apply`].
    pub fn set_distance(&mut self, distance: f64) -> GargantuaResult<SimulationSnapshot> {
        self.apply(ControlEvent::SetDistance(distance))
    }

    /// Stops the loop and hands back the session.
    #[must_use]
    pub fn into_session(mut self) -> Session {
        self.stop();
        match std::mem::replace(&mut self.slot, Slot::Vacant) {
            Slot::Idle(session) => session,
            // `stop` always leaves the slot idle.
            Slot::Running(_) | Slot::Vacant => Session::new(self.sim_config.clone()),
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        // Deterministic teardown: no timer outlives its runtime.
        self.stop();
    }
}

fn disconnected() -> GargantuaError {
    GargantuaError::Execution(ExecutionError::Disconnected {
        path: CONTROL_PATH.to_string(),
    })
}

enum Flow {
    Continue,
    Exit,
}

fn handle_control(session: &mut Session, snapshots: &SnapshotCell, msg: ControlMsg) -> Flow {
    match msg {
        ControlMsg::Apply {
            event,
            ticket,
            reply,
        } => {
            if !ticket.claim() {
                tracing::debug!(session = %session.id(), ?event, "skipping cancelled control event");
                return Flow::Continue;
            }
            session.apply(event);
            let snapshot = session.snapshot();
            snapshots.publish(snapshot);
            let _ = reply.send(snapshot);
            Flow::Continue
        }
        ControlMsg::Shutdown => Flow::Exit,
    }
}

fn worker_loop(
    mut session: Session,
    interval: Duration,
    control_rx: Receiver<ControlMsg>,
    snapshots: Arc<SnapshotCell>,
) -> Session {
    let ticker = tick(interval);

    loop {
        select! {
            recv(control_rx) -> msg => {
                let Ok(msg) = msg else { break };
                if let Flow::Exit = handle_control(&mut session, &snapshots, msg) {
                    break;
                }
            }
            recv(ticker) -> _ => {
                // Pending control messages win over the tick, so a shutdown
                // requested before this tick suppresses it.
                let mut exit = false;
                loop {
                    match control_rx.try_recv() {
                        Ok(msg) => {
                            if let Flow::Exit = handle_control(&mut session, &snapshots, msg) {
                                exit = true;
                                break;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            exit = true;
                            break;
                        }
                    }
                }
                if exit {
                    break;
                }
                session.tick();
                snapshots.publish(session.snapshot());
            }
        }
    }

    session
}
