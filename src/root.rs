//! Root lifecycle: render, update and unmount.

use std::time::{Duration, Instant};

use crate::diff::UpdateChecks;
use crate::element::Element;
use crate::error::DescriptionError;
use crate::graph::{NodeGraph, NodeId};
use crate::host::CanvasHost;
use crate::reconciler::{ErrorHandler, Reconciler};
use crate::scheduler::{Scheduler, TimeoutId, TimerQueue};

fn log_description_error(error: &DescriptionError) {
    log::error!("error while committing description: {error}");
}

/// Options for creating a root.
pub struct RootConfig {
    on_error: ErrorHandler,
    update_checks: UpdateChecks,
    scheduler: Box<dyn Scheduler>,
}

impl RootConfig {
    pub fn new() -> Self {
        Self {
            on_error: Box::new(log_description_error),
            update_checks: UpdateChecks::default(),
            scheduler: Box::new(TimerQueue::new()),
        }
    }

    /// Replace the default handler, which logs description errors.
    pub fn on_error(mut self, handler: impl FnMut(&DescriptionError) + 'static) -> Self {
        self.on_error = Box::new(handler);
        self
    }

    pub fn update_checks(mut self, checks: UpdateChecks) -> Self {
        self.update_checks = checks;
        self
    }

    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    /// Create a root and commit `description` into it.
    pub fn render(self, description: impl Into<Element>) -> RootHandle {
        let mut root = RootHandle {
            reconciler: Reconciler::new(CanvasHost::new(self.update_checks), self.on_error),
            scheduler: self.scheduler,
            deferred: None,
            unmounted: false,
        };
        root.commit(description.into());
        root
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a root with default options and commit `description` into it.
pub fn render(description: impl Into<Element>) -> RootHandle {
    RootConfig::new().render(description)
}

/// A mounted root and its committed node graph.
pub struct RootHandle {
    reconciler: Reconciler<CanvasHost>,
    scheduler: Box<dyn Scheduler>,
    deferred: Option<(TimeoutId, Element)>,
    unmounted: bool,
}

impl RootHandle {
    fn commit(&mut self, description: Element) {
        self.reconciler.update_container(Some(description));
        log::debug!(
            "committed root: {} top-level, {} live nodes",
            self.graph().container().children().len(),
            self.graph().len()
        );
    }

    /// Reconcile `description` against the committed graph now.
    ///
    /// A pending deferred update is dropped in favour of this one.
    pub fn update(&mut self, description: impl Into<Element>) {
        if self.unmounted {
            log::warn!("update on an unmounted root ignored");
            return;
        }
        if let Some((id, _)) = self.deferred.take() {
            self.scheduler.cancel_timeout(id);
        }
        self.commit(description.into());
    }

    /// Commit `description` when the scheduler next reports the root's
    /// timeout as due. Later deferred updates replace earlier ones that have
    /// not been committed yet.
    pub fn update_deferred(&mut self, description: impl Into<Element>) {
        if self.unmounted {
            log::warn!("deferred update on an unmounted root ignored");
            return;
        }
        let id = match self.deferred.take() {
            Some((id, _)) => id,
            None => self.scheduler.schedule_timeout(Duration::ZERO),
        };
        self.deferred = Some((id, description.into()));
    }

    /// Commit a deferred update whose timeout is due at `now`.
    /// Returns whether a commit happened.
    pub fn run_timers(&mut self, now: Instant) -> bool {
        let expired = self.scheduler.take_expired(now);
        let due = matches!(&self.deferred, Some((id, _)) if expired.contains(id));
        if !due {
            return false;
        }
        match self.deferred.take() {
            Some((_, description)) => {
                self.commit(description);
                true
            }
            None => false,
        }
    }

    /// Commit any deferred update immediately.
    pub fn flush(&mut self) -> bool {
        match self.deferred.take() {
            Some((id, description)) => {
                self.scheduler.cancel_timeout(id);
                self.commit(description);
                true
            }
            None => false,
        }
    }

    pub fn has_pending_update(&self) -> bool {
        self.deferred.is_some()
    }

    /// Tear down the whole graph. Further updates are ignored.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        if let Some((id, _)) = self.deferred.take() {
            self.scheduler.cancel_timeout(id);
        }
        self.reconciler.update_container(None);
        self.unmounted = true;
        log::debug!("root unmounted");
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    pub fn graph(&self) -> &NodeGraph {
        self.reconciler.host().graph()
    }

    /// Committed top-level children, in order.
    pub fn children(&self) -> &[NodeId] {
        self.graph().container().children()
    }
}
