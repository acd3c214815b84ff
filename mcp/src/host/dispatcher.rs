use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::thread::JoinHandle;

use error_stack::Report;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;

use super::Host;
use crate::constants::HOST_THREAD_NAME;
use crate::error::Error;
use crate::error::Result;

type Job = Box<dyn FnOnce(&mut dyn Host) + Send>;

/// Dedicated OS thread owning the host; every unit of work touching live objects runs here
///
/// The host is built on the thread itself, so it never has to be `Send`. Dropping the dispatcher
/// closes the job channel and joins the thread once queued work has drained.
pub struct HostThread {
    jobs:   Option<mpsc::UnboundedSender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for HostThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostThread")
            .field("running", &self.jobs.as_ref().is_some_and(|jobs| !jobs.is_closed()))
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "host work panicked".to_string())
}

impl HostThread {
    /// Start the thread and build the host on it with `factory`
    pub fn spawn<H, F>(factory: F) -> Result<Self>
    where
        H: Host + 'static,
        F: FnOnce() -> H + Send + 'static,
    {
        let (jobs, mut receiver) = mpsc::unbounded_channel::<Job>();
        let thread = std::thread::Builder::new()
            .name(HOST_THREAD_NAME.to_string())
            .spawn(move || {
                let mut host = factory();
                debug!("Host thread started");
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut host);
                    host.update();
                }
                debug!("Host thread stopped");
            })
            .map_err(|e| Report::new(Error::failed_to("spawn the host thread", e)))?;

        Ok(Self {
            jobs:   Some(jobs),
            thread: Some(thread),
        })
    }

    /// Queue `work` on the host thread and return a future for its result
    ///
    /// `cancel` is checked when the work is about to run; a cancelled token skips it. A panic in
    /// `work` is caught and reported as an invocation fault, the thread keeps serving.
    pub fn run<T, F>(&self, cancel: &CancellationToken, work: F) -> BoxFuture<'static, Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Host) -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel::<std::result::Result<T, Error>>();
        let cancel = cancel.clone();
        let job: Job = Box::new(move |host: &mut dyn Host| {
            if cancel.is_cancelled() {
                let _ = sender.send(Err(Error::Cancelled(
                    "the request was cancelled before it reached the host thread".to_string(),
                )));
                return;
            }
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| work(host))).map_err(
                |payload| {
                    let message = panic_message(payload.as_ref());
                    error!(%message, "Host work panicked");
                    Error::InvocationFault(message)
                },
            );
            let _ = sender.send(outcome);
        });

        if let Some(jobs) = &self.jobs {
            // a closed channel drops the job, which surfaces below
            let _ = jobs.send(job);
        }

        async move {
            receiver
                .await
                .map_err(|_| Report::new(Error::failed_to("dispatch", "the host thread is not running")))?
                .map_err(Report::new)
        }
        .boxed()
    }
}

impl Drop for HostThread {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take()
            && thread.thread().id() != std::thread::current().id()
            && thread.join().is_err()
        {
            error!("Host thread terminated abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::reflect::Handle;
    use crate::reflect::Reflect;

    #[derive(Default)]
    struct CountingHost {
        updates: Arc<AtomicUsize>,
    }

    impl Host for CountingHost {
        fn resolve(&self, _handle: Handle) -> Option<&dyn Reflect> { None }

        fn apply(
            &mut self,
            handle: Handle,
            _object: Box<dyn Reflect>,
        ) -> std::result::Result<(), Error> {
            Err(Error::ReferenceNotFound(handle.id()))
        }

        fn update(&mut self) { self.updates.fetch_add(1, Ordering::SeqCst); }
    }

    fn count_job(host: &mut dyn Host) -> String {
        host.resolve(Handle::new(1))
            .map_or_else(|| "nothing".to_string(), |obj| obj.type_name().to_string())
    }

    #[tokio::test]
    async fn test_work_runs_on_named_thread() {
        let dispatcher = HostThread::spawn(CountingHost::default).expect("spawn host thread");
        let name = dispatcher
            .run(&CancellationToken::new(), |_host| {
                std::thread::current().name().map(ToString::to_string)
            })
            .await
            .expect("work should run");
        assert_eq!(name.as_deref(), Some(HOST_THREAD_NAME));

        let resolved = dispatcher
            .run(&CancellationToken::new(), count_job)
            .await
            .expect("work should run");
        assert_eq!(resolved, "nothing");
    }

    #[tokio::test]
    async fn test_cancelled_work_is_skipped() {
        let dispatcher = HostThread::spawn(CountingHost::default).expect("spawn host thread");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let outcome = dispatcher
            .run(&cancel, move |_host| counter.fetch_add(1, Ordering::SeqCst))
            .await;

        assert!(outcome.is_err_and(|report| matches!(report.current_context(), Error::Cancelled(_))));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_is_reported_and_thread_survives() {
        let dispatcher = HostThread::spawn(CountingHost::default).expect("spawn host thread");
        let outcome: Result<()> = dispatcher
            .run(&CancellationToken::new(), |_host| {
                std::panic::panic_any("reflection capture exploded".to_string())
            })
            .await;
        let message = outcome
            .err()
            .map(|report| report.current_context().to_string())
            .unwrap_or_default();
        assert!(message.contains("reflection capture exploded"), "{message}");

        let after = dispatcher.run(&CancellationToken::new(), |_host| 7).await;
        assert_eq!(after.ok(), Some(7));
    }

    #[tokio::test]
    async fn test_update_runs_after_every_job() {
        let updates = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&updates);
        let dispatcher = HostThread::spawn(move || CountingHost { updates: shared })
            .expect("spawn host thread");

        for _ in 0..3 {
            let _ = dispatcher.run(&CancellationToken::new(), |_host| ()).await;
        }
        drop(dispatcher);
        assert_eq!(updates.load(Ordering::SeqCst), 3);
    }
}
