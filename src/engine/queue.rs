use std::thread;

use crossbeam::channel;
use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, error, instrument};

use crate::error::{Result, StoreError};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A queue of jobs that all run, one at a time, on a single writer thread.
///
/// This uses the MPMC [`channel`] provided by the crossbeam crate as a multiple producer,
/// single consumer queue. Every clone of the queue is a producer, and the writer thread is
/// the only consumer, so two jobs never run at the same time.
///
/// If a job panics the writer thread is replaced by a new one. The thread exits once the last
/// clone of the queue is dropped.
///
/// [`channel`]: https://docs.rs/crossbeam/0.8.1/crossbeam/channel/index.html
#[derive(Clone, Debug)]
pub(crate) struct WriteQueue {
    tx: Sender<Job>,
}

impl WriteQueue {
    /// starts the writer thread
    pub fn start() -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        spawn_writer(JobReceiver(rx))?;
        Ok(WriteQueue { tx })
    }

    /// runs `job` on the writer thread and blocks until its result comes back
    ///
    /// # Errors
    /// returns whatever `job` returns, or [`StoreError::WriterGone`] if the writer thread is
    /// not running or panicked while running `job`
    pub fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.tx
            .send(Box::new(move || {
                // the caller is blocked on recv, it only goes away if it panicked
                let _ = reply_tx.send(job());
            }))
            .map_err(|_| StoreError::WriterGone)?;

        reply_rx.recv().map_err(|_| StoreError::WriterGone)?
    }
}

fn spawn_writer(rx: JobReceiver) -> Result<()> {
    thread::Builder::new()
        .name("itemstore-writer".into())
        .spawn(move || run_jobs(rx))?;
    Ok(())
}

/// Receives jobs from the queue. Additionally, this type is responsible for restarting the
/// writer thread if a job panicked
#[derive(Clone, Debug)]
struct JobReceiver(Receiver<Job>);

impl Drop for JobReceiver {
    #[instrument(skip(self))]
    fn drop(&mut self) {
        if thread::panicking() {
            debug!("writer panicked, starting a new writer thread");
            if let Err(e) = spawn_writer(self.clone()) {
                error!("Failed to spawn the writer thread: {}", e);
            }
        }
    }
}

/// waits for jobs to arrive on the (wrapped) receiver and runs them in order
fn run_jobs(rx: JobReceiver) {
    while let Ok(job) = rx.0.recv() {
        job();
    }
    debug!("writer exited because every store handle was dropped");
}
