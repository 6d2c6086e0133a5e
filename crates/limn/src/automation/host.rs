//! The automation host: one worker thread, one session, one job queue.
//!
//! Every call into the external application runs as a job on the host's
//! worker thread. Callers block until their job finishes. Jobs run one at a
//! time in submission order. A panic inside a job is caught on the worker
//! and resumed on the thread that submitted the job; the worker keeps
//! serving later jobs.

use std::{
    any::Any,
    fmt,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender, SyncSender},
    thread::{self, JoinHandle, ThreadId},
};

use log::{debug, error, info};
use parking_lot::Mutex;

use super::{AutomationError, session::Session, session::SessionError, workbench::Workbench};
use crate::templates::TemplateResolver;

type Job<S> = Box<dyn FnOnce(&mut Workbench<S>) + Send>;

type Outcome<T> = Result<T, Box<dyn Any + Send>>;

/// A submitted job whose result has not been collected yet.
#[must_use = "a pending job does nothing observable until waited on"]
pub struct Pending<T> {
    reply: Receiver<Outcome<T>>,
}

impl<T> Pending<T> {
    /// Blocks until the job has run and returns its value.
    ///
    /// A panic raised by the job is resumed on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::WorkerLost`] if the worker exited without
    /// running the job.
    pub fn wait(self) -> Result<T, AutomationError> {
        match self.reply.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(AutomationError::WorkerLost),
        }
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

/// Runs jobs against one [`Session`] on a dedicated worker thread.
///
/// The session is created on the worker by the factory passed to
/// [`AutomationHost::start`] and never leaves it. Dropping the host shuts it
/// down.
///
/// # Examples
///
/// ```
/// use limn::{automation::AutomationHost, sketch::SketchSession};
///
/// let host = AutomationHost::start(|| Ok(SketchSession::new())).unwrap();
/// let pages = host
///     .invoke_with_result(|workbench| Ok(workbench.session().page_count()))
///     .unwrap();
/// assert_eq!(pages, 0);
/// host.shutdown();
/// ```
pub struct AutomationHost<S: Session + 'static> {
    sender: Mutex<Option<Sender<Job<S>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
    _session: PhantomData<fn() -> S>,
}

impl<S: Session + 'static> AutomationHost<S> {
    /// Spawns the worker and opens the session on it.
    ///
    /// Returns once the session is open.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Start`] when the factory fails and
    /// [`AutomationError::Spawn`] when the thread cannot be created.
    pub fn start<F>(connect: F) -> Result<Self, AutomationError>
    where
        F: FnOnce() -> Result<S, SessionError> + Send + 'static,
    {
        Self::start_with(connect, Vec::new())
    }

    /// Like [`start`](Self::start), resolving relative template paths
    /// against `search_dirs` as well.
    pub fn start_with<F>(connect: F, search_dirs: Vec<PathBuf>) -> Result<Self, AutomationError>
    where
        F: FnOnce() -> Result<S, SessionError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Job<S>>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let worker = thread::Builder::new()
            .name("limn-automation".into())
            .spawn(move || run_worker(connect, search_dirs, receiver, ready_tx))
            .map_err(AutomationError::Spawn)?;
        let worker_id = worker.thread().id();

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = worker.join();
                return Err(AutomationError::Start(err));
            }
            Err(_) => {
                let _ = worker.join();
                return Err(AutomationError::WorkerLost);
            }
        }
        info!("Automation host started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            worker_id,
            _session: PhantomData,
        })
    }

    /// Queues a job and returns a ticket for its result without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::ShutDown`] once shutdown has begun and
    /// [`AutomationError::Reentrant`] when called from inside a job.
    pub fn submit<T, F>(&self, job: F) -> Result<Pending<T>, AutomationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Workbench<S>) -> T + Send + 'static,
    {
        if thread::current().id() == self.worker_id {
            return Err(AutomationError::Reentrant);
        }

        let (reply_tx, reply_rx): (SyncSender<Outcome<T>>, _) = mpsc::sync_channel(1);
        let job: Job<S> = Box::new(move |workbench| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(workbench)));
            if outcome.is_err() {
                error!("Automation job panicked");
            }
            // The submitter may have dropped its ticket.
            let _ = reply_tx.send(outcome);
        });

        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(AutomationError::ShutDown)?;
        sender.send(job).map_err(|_| AutomationError::WorkerLost)?;
        Ok(Pending { reply: reply_rx })
    }

    /// Runs a job on the worker and waits for it.
    pub fn invoke<F>(&self, job: F) -> Result<(), AutomationError>
    where
        F: FnOnce(&mut Workbench<S>) -> Result<(), AutomationError> + Send + 'static,
    {
        self.invoke_with_result(job)
    }

    /// Runs a job on the worker, waits for it and returns its value.
    ///
    /// An error returned by the job is handed back unchanged; a panic is
    /// resumed on the calling thread.
    pub fn invoke_with_result<T, F>(&self, job: F) -> Result<T, AutomationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Workbench<S>) -> Result<T, AutomationError> + Send + 'static,
    {
        self.submit(job)?.wait()?
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stops accepting jobs, drains the queue and joins the worker.
    ///
    /// Jobs queued before the call still run. Idempotent.
    pub fn shutdown(&self) {
        if let Some(sender) = self.sender.lock().take() {
            debug!("Closing automation job queue");
            drop(sender);
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if thread::current().id() == self.worker_id {
                error!("Automation host shut down from its own worker, not joining");
                return;
            }
            if worker.join().is_err() {
                error!("Automation worker panicked during shutdown");
            }
            info!("Automation host shut down");
        }
    }
}

impl<S: Session + 'static> Drop for AutomationHost<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: Session + 'static> fmt::Debug for AutomationHost<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationHost")
            .field("worker_id", &self.worker_id)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn run_worker<S, F>(
    connect: F,
    search_dirs: Vec<PathBuf>,
    jobs: Receiver<Job<S>>,
    ready: SyncSender<Result<(), SessionError>>,
) where
    S: Session,
    F: FnOnce() -> Result<S, SessionError>,
{
    let session = match connect() {
        Ok(session) => session,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    debug!("Automation session opened");

    let templates = search_dirs
        .into_iter()
        .fold(TemplateResolver::new(), |resolver, dir| resolver.with_search_dir(dir));
    let mut workbench = Workbench::with_resolver(session, templates);
    let mut served = 0usize;
    // Ends once every sender is gone and the queue is empty.
    for job in jobs {
        job(&mut workbench);
        served += 1;
    }

    workbench.close();
    debug!(jobs = served; "Automation worker exiting");
}
