//! Bounded-concurrency job pool
//!
//! A fixed number of workers drain a bounded job queue while a single drain
//! task prints the result lines they produce. The first failing or panicking
//! job cancels the pool: workers stop taking jobs, producers stop
//! submitting, and the error is returned from [`JobPool::finish`].
//!
//! Shutdown runs in order: the job queue closes, every worker exits, the
//! output channel closes, and the drain task prints whatever is left.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::printer::Printer;

/// A unit of work, executed at most once by exactly one worker
pub type Job = BoxFuture<'static, Result<()>>;

type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

#[derive(Debug)]
enum Message {
    Line(String),
    Error(String),
}

/// Handle through which a job reports its result lines
#[derive(Clone, Debug)]
pub struct OutputSender {
    tx: mpsc::Sender<Message>,
}

impl OutputSender {
    /// Queue a result line for the drain task
    ///
    /// Waits while the output channel is full, so the line is delivered
    /// before the job completes.
    pub async fn send(&self, line: impl Into<String>) {
        self.push(Message::Line(line.into())).await;
    }

    /// Queue a non-fatal error line for the drain task
    pub async fn send_error(&self, line: impl Into<String>) {
        self.push(Message::Error(line.into())).await;
    }

    async fn push(&self, message: Message) {
        if self.tx.send(message).await.is_err() {
            tracing::warn!("output channel closed, dropping result line");
        }
    }
}

/// Bounded-concurrency executor for one bulk operation
pub struct JobPool {
    jobs: mpsc::Sender<Job>,
    output: OutputSender,
    cancel: CancellationToken,
    workers: JoinHandle<Result<()>>,
    drain: JoinHandle<()>,
}

impl JobPool {
    /// Start `parallel` workers and the drain task
    ///
    /// Both channels hold at most `parallel` entries. Must be called from
    /// within a tokio runtime.
    pub fn new(parallel: usize, printer: Arc<dyn Printer>) -> Self {
        let parallel = parallel.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>(parallel);
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(parallel);
        let cancel = CancellationToken::new();

        let queue: JobQueue = Arc::new(Mutex::new(jobs_rx));
        let mut set = JoinSet::new();
        for id in 0..parallel {
            set.spawn(worker(id, Arc::clone(&queue), cancel.clone()));
        }
        drop(queue);

        let workers = tokio::spawn(supervise(set));

        let drain = tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match message {
                    Message::Line(line) => printer.line(&line),
                    Message::Error(line) => printer.error(&line),
                }
            }
        });

        tracing::debug!(parallel, "job pool started");

        Self {
            jobs: jobs_tx,
            output: OutputSender { tx: out_tx },
            cancel,
            workers,
            drain,
        }
    }

    /// Token cancelled by the first failing job
    ///
    /// Long-running producers (walks, listing loops) check it between items.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether a job has already failed
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Queue a job, waiting while every worker is busy and the queue is full
    ///
    /// `job` receives the output handle and returns the future to run; the
    /// future is not polled until a worker picks it up. Returns `false` when
    /// the pool has been cancelled and the job was not queued.
    pub async fn submit<F, Fut>(&self, job: F) -> bool
    where
        F: FnOnce(OutputSender) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return false;
        }

        let job: Job = Box::pin(job(self.output.clone()));
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.jobs.send(job) => sent.is_ok(),
        }
    }

    /// Close the queue and wait for every worker and the drain task
    ///
    /// Returns the first job error, if any.
    pub async fn finish(self) -> Result<()> {
        let Self {
            jobs,
            output,
            cancel: _,
            workers,
            drain,
        } = self;

        drop(jobs);
        let result = match workers.await {
            Ok(result) => result,
            Err(e) => Err(Error::General(format!("job pool supervisor failed: {e}"))),
        };

        drop(output);
        if let Err(e) = drain.await {
            tracing::warn!("output drain task failed: {e}");
        }

        result
    }
}

async fn worker(id: usize, queue: JobQueue, cancel: CancellationToken) -> Result<()> {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };

        let Some(job) = next else {
            tracing::debug!(worker = id, "worker exiting");
            return Ok(());
        };

        let outcome = AssertUnwindSafe(job)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic_message(&*panic);
                Err(Error::General(format!("job panicked: {message}")))
            });

        if let Err(e) = outcome {
            cancel.cancel();
            return Err(e);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Join all workers, keeping the first error and logging the rest
async fn supervise(mut set: JoinSet<Result<()>>) -> Result<()> {
    let mut first: Option<Error> = None;

    while let Some(joined) = set.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(Error::General(format!("worker failed: {e}"))));
        if let Err(e) = outcome {
            if first.is_none() {
                first = Some(e);
            } else {
                tracing::warn!("additional job failure: {e}");
            }
        }
    }

    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
