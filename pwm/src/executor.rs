//! Worker pool that runs PWM jobs off the caller's thread.
//!
//! Jobs are picked up by a fixed set of worker threads and run synchronously there. Finished
//! requests are posted to a single completion queue, and completion callbacks only ever run
//! on the thread that owns the [PwmExecutor], from [PwmExecutor::run_pending] or
//! [PwmExecutor::run_until_idle].
//!
//! Submitted jobs cannot be cancelled. Dropping the executor stops accepting work, but the
//! workers still finish every job already queued; callbacks of jobs not yet delivered are
//! dropped without being called.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use log::{debug, trace, warn};
use crate::control::PwmContext;
use crate::dispatch::{PwmJob, PwmOp};
use crate::{PwmRequest, ResultCode};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct JobId(u64);

type Completion = Box<dyn FnOnce(PwmRequest)>;

pub struct PwmExecutor {
    jobs: Option<Sender<(JobId, PwmJob)>>,
    completions: Receiver<(JobId, PwmRequest)>,
    callbacks: HashMap<JobId, Completion>,
    workers: Vec<JoinHandle<()>>,
    next_id: u64,
}

impl PwmExecutor {
    /// Spawns `workers` threads (at least one) running jobs against `ctx`.
    pub fn new(ctx: PwmContext, workers: usize) -> std::io::Result<Self> {
        let (job_tx, job_rx) = channel::<(JobId, PwmJob)>();
        let (done_tx, done_rx) = channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let handles = (0..workers.max(1))
            .map(|index| {
                let ctx = ctx.clone();
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                thread::Builder::new()
                    .name(format!("pwm-worker-{}", index))
                    .spawn(move || worker_loop(ctx, jobs, done))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Started {} PWM workers", handles.len());

        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            callbacks: HashMap::new(),
            workers: handles,
            next_id: 0,
        })
    }

    /// Queues `op` on `request`. `on_complete` receives the request, with its result set,
    /// once the job is done and the caller drives the completion queue.
    ///
    /// If no worker is left to take the job, `on_complete` runs right away with
    /// [ResultCode::SysFailure].
    pub fn submit(
        &mut self,
        op: PwmOp,
        request: PwmRequest,
        on_complete: impl FnOnce(PwmRequest) + 'static,
    ) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;

        trace!("Submitting PWM {} on channel {} as {:?}", op, request.pin, id);
        self.callbacks.insert(id, Box::new(on_complete));

        let job = PwmJob::new(op, request);
        let unsent = match &self.jobs {
            Some(jobs) => jobs.send((id, job)).err().map(|err| (err.0).1),
            None => Some(job),
        };
        if let Some(job) = unsent {
            // Only possible when every worker is gone; the caller still gets its result.
            warn!("No PWM worker left to run {:?}", id);
            let mut request = job.request;
            request.result = Some(ResultCode::SysFailure);
            self.complete(id, request);
        }
        id
    }

    /// Number of jobs whose completion has not been delivered yet.
    pub fn pending(&self) -> usize {
        self.callbacks.len()
    }

    /// Delivers every completion already available, without blocking.
    /// Returns how many callbacks ran.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok((id, request)) = self.completions.try_recv() {
            self.complete(id, request);
            count += 1;
        }
        count
    }

    /// Blocks until every submitted job has completed and its callback has run.
    /// Returns how many callbacks ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut count = 0;
        while !self.callbacks.is_empty() {
            match self.completions.recv() {
                Ok((id, request)) => {
                    self.complete(id, request);
                    count += 1;
                }
                Err(_) => {
                    warn!("PWM workers exited with {} jobs outstanding", self.callbacks.len());
                    break;
                }
            }
        }
        count
    }

    fn complete(&mut self, id: JobId, request: PwmRequest) {
        if let Some(callback) = self.callbacks.remove(&id) {
            callback(request);
        }
    }
}

fn worker_loop(
    ctx: PwmContext,
    jobs: Arc<Mutex<Receiver<(JobId, PwmJob)>>>,
    done: Sender<(JobId, PwmRequest)>,
) {
    loop {
        let next = {
            let jobs = jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            jobs.recv()
        };
        let Ok((id, job)) = next else {
            break;
        };
        let request = job.run(&ctx);
        if done.send((id, request)).is_err() {
            // The executor is being dropped; keep draining the queue.
            trace!("Completion of {:?} dropped", id);
        }
    }
}

impl Debug for PwmExecutor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PwmExecutor({} workers, {} pending)", self.workers.len(), self.callbacks.len())
    }
}

impl Drop for PwmExecutor {
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("PWM worker panicked");
            }
        }
    }
}
