//! Per-routine control block: live config, latest output and the
//! cancel/done signal pair.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Mutable state of one running routine instance.
///
/// Shared between the scheduler (writes config, requests cancel), the
/// routine's own execution loop (writes output, reads config) and status
/// readers. Config and output are swapped as whole `Arc`s, so a reader never
/// observes a partially written value.
pub struct ControlBlock<C, O> {
    config: ArcSwap<C>,
    output: ArcSwap<O>,
    cancel: CancellationToken,
    done: watch::Sender<bool>,
}

impl<C, O> ControlBlock<C, O> {
    /// Seed a control block with `config` and an initial `output`.
    pub fn new(config: Arc<C>, output: O) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            config: ArcSwap::new(config),
            output: ArcSwap::from_pointee(output),
            cancel: CancellationToken::new(),
            done,
        }
    }

    pub fn load_config(&self) -> Arc<C> {
        self.config.load_full()
    }

    /// Replace the config. Concurrent writers race; the last store wins.
    pub fn store_config(&self, config: Arc<C>) {
        self.config.store(config);
    }

    /// Derive a new config from the current one (read-copy-update).
    ///
    /// `f` may run more than once if another writer replaces the config
    /// between the read and the swap.
    pub fn modify_config<F>(&self, f: F)
    where
        F: Fn(&C) -> C,
    {
        self.config.rcu(|current| Arc::new(f(current)));
    }

    pub fn load_output(&self) -> Arc<O> {
        self.output.load_full()
    }

    pub fn store_output(&self, output: O) {
        self.output.store(Arc::new(output));
    }

    /// Ask the execution loop to stop after its current iteration.
    /// Idempotent: only the first call has any effect.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been requested. Jobs with long waits
    /// can race this against their work to return early.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// True once the execution loop has exited and deregistered itself.
    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until the execution loop has fully exited.
    pub async fn await_done(&self) {
        let mut rx = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Signal completion. Called exactly once by the loop's teardown.
    pub(crate) fn mark_done(&self) {
        self.done.send_replace(true);
    }
}

impl<C, O> std::fmt::Debug for ControlBlock<C, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBlock")
            .field("cancel_requested", &self.is_cancel_requested())
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}
