//! The single mutation serialization queue. A dedicated worker task
//! dequeues write tasks one at a time while holding the write lock;
//! everything else reads via the lock directly. Shutdown pairs a cloneable
//! signal handle with a private listener, using `tokio_util::sync::CancellationToken`
//! rather than a hand-rolled `Notify` pair because this root needs to fan
//! out to more than one independent waiter.

use crate::manager::ManagerState;
use core_errors::ShellError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex as AsyncMutex, RwLock, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Bounded channel capacity for queued write tasks.
pub const WRITER_CHANNEL_CAP: usize = 256;

type WriteFn = Box<dyn FnOnce(&mut ManagerState) -> Result<(), ShellError> + Send>;

struct QueuedWrite {
    task: WriteFn,
    reply: Option<oneshot::Sender<Result<(), ShellError>>>,
}

#[cfg(debug_assertions)]
mod depth_guard {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static WRITE_DEPTH: AtomicUsize = AtomicUsize::new(0);

    pub struct WriteDepthGuard;

    impl WriteDepthGuard {
        pub fn enter() -> Self {
            WRITE_DEPTH.fetch_add(1, Ordering::SeqCst);
            Self
        }
    }

    impl Drop for WriteDepthGuard {
        fn drop(&mut self) {
            WRITE_DEPTH.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Panics if called while a write-lock guard is held on this thread's
    /// call stack. Compiled out entirely in release builds.
    pub fn assert_not_under_write_lock() {
        if WRITE_DEPTH.load(Ordering::SeqCst) != 0 {
            panic!(
                "script invoked while the writer actor's write lock is held\n{}",
                std::backtrace::Backtrace::force_capture()
            );
        }
    }
}

#[cfg(not(debug_assertions))]
mod depth_guard {
    pub struct WriteDepthGuard;
    impl WriteDepthGuard {
        pub fn enter() -> Self {
            Self
        }
    }
    pub fn assert_not_under_write_lock() {}
}

pub use depth_guard::assert_not_under_write_lock;
use depth_guard::WriteDepthGuard;

/// A clonable front-end to the writer actor. Producers never touch the
/// `RwLock` directly.
#[derive(Clone)]
pub struct WriterHandle {
    sender: mpsc::Sender<QueuedWrite>,
    shutdown: Arc<AtomicBool>,
    already_stopped: Arc<AtomicBool>,
    stop: CancellationToken,
    send_gate: Arc<AsyncMutex<()>>,
}

impl WriterHandle {
    pub fn spawn(state: Arc<RwLock<ManagerState>>, root: CancellationToken) -> Self {
        let (sender, receiver) = mpsc::channel(WRITER_CHANNEL_CAP);
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = Self {
            sender,
            shutdown: shutdown.clone(),
            already_stopped: Arc::new(AtomicBool::new(false)),
            stop: root.child_token(),
            send_gate: Arc::new(AsyncMutex::new(())),
        };
        tokio::spawn(Self::run(state, receiver, shutdown, handle.stop.clone()));
        handle
    }

    async fn run(
        state: Arc<RwLock<ManagerState>>,
        mut receiver: mpsc::Receiver<QueuedWrite>,
        shutdown: Arc<AtomicBool>,
        stop: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    shutdown.store(true, Ordering::SeqCst);
                    while let Ok(queued) = receiver.try_recv() {
                        Self::run_task(&state, queued).await;
                    }
                    break;
                }
                queued = receiver.recv() => {
                    match queued {
                        Some(queued) => Self::run_task(&state, queued).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn run_task(state: &Arc<RwLock<ManagerState>>, queued: QueuedWrite) {
        let mut guard = state.write().await;
        let _depth = WriteDepthGuard::enter();
        let result = (queued.task)(&mut guard);
        drop(_depth);
        drop(guard);
        if let Some(reply) = queued.reply {
            let _ = reply.send(result);
        }
    }

    /// Fire-and-forget enqueue.
    pub async fn schedule_write(
        &self,
        f: impl FnOnce(&mut ManagerState) -> Result<(), ShellError> + Send + 'static,
    ) -> Result<(), ShellError> {
        let _gate = self.send_gate.lock().await;
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(ShellError::ShutdownInProgress);
        }
        self.sender
            .send(QueuedWrite {
                task: Box::new(f),
                reply: None,
            })
            .await
            .map_err(|_| ShellError::ShutdownInProgress)
    }

    /// Enqueue and block the caller until the task runs.
    pub async fn schedule_write_and_wait(
        &self,
        f: impl FnOnce(&mut ManagerState) -> Result<(), ShellError> + Send + 'static,
    ) -> Result<(), ShellError> {
        let (tx, rx) = oneshot::channel();
        {
            let _gate = self.send_gate.lock().await;
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(ShellError::ShutdownInProgress);
            }
            self.sender
                .send(QueuedWrite {
                    task: Box::new(f),
                    reply: Some(tx),
                })
                .await
                .map_err(|_| ShellError::ShutdownInProgress)?;
        }
        rx.await.map_err(|_| ShellError::ShutdownInProgress)?
    }

    /// Idempotent: a second call observes `already_stopped` and no-ops.
    pub fn shutdown(&self) {
        if self.already_stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        self.stop.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_manager_state() -> Arc<RwLock<ManagerState>> {
        Arc::new(RwLock::new(ManagerState::default()))
    }

    #[tokio::test]
    async fn schedule_write_mutates_state() {
        let state = new_manager_state();
        let writer = WriterHandle::spawn(state.clone(), CancellationToken::new());
        writer
            .schedule_write(|s| {
                s.exit_requested = true;
                Ok(())
            })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(state.read().await.exit_requested);
    }

    #[tokio::test]
    async fn schedule_write_and_wait_observes_completion() {
        let state = new_manager_state();
        let writer = WriterHandle::spawn(state.clone(), CancellationToken::new());
        writer
            .schedule_write_and_wait(|s| {
                s.exit_requested = true;
                Ok(())
            })
            .await
            .unwrap();
        assert!(state.read().await.exit_requested);
    }

    #[tokio::test]
    async fn writes_are_sequentially_consistent_with_enqueue_order() {
        let state = new_manager_state();
        let writer = WriterHandle::spawn(state.clone(), CancellationToken::new());
        for i in 0..50i64 {
            let state_manager_key = i;
            writer
                .schedule_write(move |s| {
                    s.global_command_order.push(state_manager_key.to_string());
                    Ok(())
                })
                .await
                .unwrap();
        }
        writer
            .schedule_write_and_wait(|_| Ok(()))
            .await
            .unwrap();
        let guard = state.read().await;
        let observed: Vec<i64> = guard
            .global_command_order
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let expected: Vec<i64> = (0..50).collect();
        assert_eq!(observed, expected);
    }

    #[tokio::test]
    async fn shutdown_refuses_new_writes() {
        let state = new_manager_state();
        let writer = WriterHandle::spawn(state.clone(), CancellationToken::new());
        writer.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let err = writer.schedule_write(|_| Ok(())).await.unwrap_err();
        assert!(matches!(err, ShellError::ShutdownInProgress));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let state = new_manager_state();
        let writer = WriterHandle::spawn(state.clone(), CancellationToken::new());
        writer.shutdown();
        writer.shutdown();
        assert!(writer.is_shutdown());
    }
}
