//! Per-thread event loop registry.
//!
//! Each thread owns at most one live [`EventLoop`], a Tokio current-thread
//! runtime held in a thread-local slot. [`get_event_loop`] returns it, creating
//! and registering a fresh loop when the slot is empty or holds a closed loop.
//! Handles are `Rc`, so a loop can never be shared with another thread.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::io;
use std::rc::Rc;

use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::LoopError;

pub use tokio::runtime::{Builder, Handle};

thread_local! {
    static CURRENT_LOOP: RefCell<Option<Rc<EventLoop>>> = const { RefCell::new(None) };
    static OFFLOADED_JOB: Cell<bool> = const { Cell::new(false) };
}

/// Settings for loops created by this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Name given to the loop's blocking-pool threads
    pub thread_name: Option<String>,
    /// Enable the Tokio timer driver
    pub enable_time: bool,
    /// Enable the Tokio I/O driver
    pub enable_io: bool,
    /// Upper bound for the loop's blocking pool
    pub max_blocking_threads: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            thread_name: None,
            enable_time: true,
            enable_io: true,
            max_blocking_threads: 512,
        }
    }
}

impl LoopConfig {
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_time(mut self, enable: bool) -> Self {
        self.enable_time = enable;
        self
    }

    pub fn with_io(mut self, enable: bool) -> Self {
        self.enable_io = enable;
        self
    }

    pub fn with_max_blocking_threads(mut self, threads: usize) -> Self {
        self.max_blocking_threads = threads;
        self
    }
}

/// A single-threaded cooperative scheduler bound to one thread.
pub struct EventLoop {
    // Only `None` while dropping.
    runtime: Option<Runtime>,
    running: Cell<bool>,
    closed: Cell<bool>,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("running", &self.running.get())
            .field("closed", &self.closed.get())
            .finish()
    }
}

impl EventLoop {
    /// Handle to the loop's runtime, used to reach its blocking pool.
    pub fn handle(&self) -> &Handle {
        self.runtime().handle()
    }

    fn runtime(&self) -> &Runtime {
        self.runtime
            .as_ref()
            .expect("dual_async::runtime::EventLoop: runtime accessed after drop")
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Marks the loop closed. The registry treats a closed loop as absent and
    /// replaces it on the next [`get_event_loop`].
    pub fn close(&self) {
        self.closed.set(true);
    }

    /// Reports whether [`run_until_complete`](Self::run_until_complete) would
    /// be allowed right now.
    ///
    /// A closed loop reports [`LoopError::NoCurrentLoop`]. A loop that is
    /// driving this thread, or a foreign Tokio runtime driving it, reports
    /// [`LoopError::AlreadyRunning`]. A worker thread running an offloaded job
    /// carries its pool's runtime context without driving it, so it may run
    /// a loop of its own.
    pub fn check_runnable(&self) -> Result<(), LoopError> {
        if self.is_closed() {
            return Err(LoopError::NoCurrentLoop {
                thread: current_thread_name(),
            });
        }

        if self.is_running() || inside_foreign_runtime() {
            return Err(LoopError::AlreadyRunning);
        }

        Ok(())
    }

    /// Blocks the calling thread until `future` completes on this loop.
    pub fn run_until_complete<F>(&self, future: F) -> Result<F::Output, LoopError>
    where
        F: Future,
    {
        self.check_runnable()?;

        let _running = RunningGuard::enter(&self.running);
        Ok(self.runtime().block_on(future))
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        // A blocking shutdown panics inside an async context.
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        }
    }
}

/// Clears the running flag even if the driven future panics.
struct RunningGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Marks the current thread as running an offloaded job until dropped.
pub(crate) struct OffloadedJob {
    previous: bool,
}

impl OffloadedJob {
    pub(crate) fn enter() -> Self {
        Self {
            previous: OFFLOADED_JOB.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for OffloadedJob {
    fn drop(&mut self) {
        OFFLOADED_JOB.with(|flag| flag.set(self.previous));
    }
}

fn inside_foreign_runtime() -> bool {
    Handle::try_current().is_ok() && !OFFLOADED_JOB.with(Cell::get)
}

/// Returns this thread's event loop, creating and registering one if needed.
pub fn get_event_loop() -> Result<Rc<EventLoop>, LoopError> {
    get_event_loop_with(&LoopConfig::default())
}

/// Like [`get_event_loop`], building any new loop from `config`.
pub fn get_event_loop_with(config: &LoopConfig) -> Result<Rc<EventLoop>, LoopError> {
    match current_event_loop() {
        Ok(event_loop) => Ok(event_loop),
        Err(LoopError::NoCurrentLoop { thread }) => {
            debug!(%thread, "no current event loop; creating one");
            recover_event_loop(config)
        }
        Err(err) => Err(err),
    }
}

/// Returns the registered loop without creating one.
pub fn current_event_loop() -> Result<Rc<EventLoop>, LoopError> {
    CURRENT_LOOP.with(|slot| match slot.borrow().as_ref() {
        Some(event_loop) if !event_loop.is_closed() => Ok(Rc::clone(event_loop)),
        _ => Err(LoopError::NoCurrentLoop {
            thread: current_thread_name(),
        }),
    })
}

/// The one recovery path for a missing loop: build a fresh loop and register
/// it as current.
pub(crate) fn recover_event_loop(config: &LoopConfig) -> Result<Rc<EventLoop>, LoopError> {
    let event_loop = Rc::new(new_event_loop_with(config)?);
    // The previous loop, if any, was closed; dropping it here shuts it down.
    drop(set_event_loop(Rc::clone(&event_loop)));
    Ok(event_loop)
}

/// Builds an unregistered loop with default settings.
pub fn new_event_loop() -> Result<EventLoop, LoopError> {
    new_event_loop_with(&LoopConfig::default())
}

pub fn new_event_loop_with(config: &LoopConfig) -> Result<EventLoop, LoopError> {
    if config.max_blocking_threads == 0 {
        return Err(LoopError::Build(io::Error::new(
            io::ErrorKind::InvalidInput,
            "max_blocking_threads must be greater than 0",
        )));
    }

    let mut builder = Builder::new_current_thread();
    builder.max_blocking_threads(config.max_blocking_threads);

    if config.enable_time {
        builder.enable_time();
    }
    if config.enable_io {
        builder.enable_io();
    }
    if let Some(name) = &config.thread_name {
        builder.thread_name(name.clone());
    }

    let runtime = builder.build()?;
    debug!(thread = %current_thread_name(), "built event loop");

    Ok(EventLoop {
        runtime: Some(runtime),
        running: Cell::new(false),
        closed: Cell::new(false),
    })
}

/// Registers `event_loop` as this thread's current loop, returning the
/// previous one.
///
/// The previous loop is handed back so the caller decides when it shuts down.
pub fn set_event_loop(event_loop: Rc<EventLoop>) -> Option<Rc<EventLoop>> {
    CURRENT_LOOP.with(|slot| slot.borrow_mut().replace(event_loop))
}

/// Unregisters this thread's loop, returning it.
pub fn clear_event_loop() -> Option<Rc<EventLoop>> {
    CURRENT_LOOP.with(|slot| slot.borrow_mut().take())
}

pub(crate) fn current_thread_name() -> String {
    let thread = std::thread::current();
    thread
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{:?}", thread.id()))
}
