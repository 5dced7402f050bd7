//! Build lifecycle events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use crate::build_ctx::BuildResults;

/// Events emitted as builds finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildEvent {
    /// Emitted for every finished build, initial and rebuilds alike.
    Build,
    /// Emitted only for rebuilds, with the same payload as `Build`.
    Rebuild,
}

/// Handle returned by [`BuildEvents::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

type Callback = Arc<dyn Fn(&BuildResults) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    event: BuildEvent,
    callback: Callback,
    once: bool,
}

/// Publish/subscribe bus owned by the compiler context.
///
/// Callbacks are invoked synchronously on the emitting thread, outside
/// the subscription lock, so a callback may subscribe or unsubscribe
/// without deadlocking.
pub struct BuildEvents {
    next_id: AtomicUsize,
    subs: Mutex<Vec<Subscription>>,
}

impl BuildEvents {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(0),
            subs: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes a callback to an event.
    pub fn on(
        &self,
        event: BuildEvent,
        callback: impl Fn(&BuildResults) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe(event, Arc::new(callback), false)
    }

    /// Removes a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subs().retain(|s| s.id != id);
    }

    /// One-shot subscription: the receiver gets the payload of the next
    /// matching event and the subscription detaches itself.
    pub fn next(&self, event: BuildEvent) -> Receiver<BuildResults> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(Some(tx));
        self.subscribe(
            event,
            Arc::new(move |results: &BuildResults| {
                if let Some(tx) = tx.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    let _ = tx.send(results.clone());
                }
            }),
            true,
        );
        rx
    }

    /// Emits an event to all current subscribers.
    pub fn emit(&self, event: BuildEvent, results: &BuildResults) {
        let callbacks: Vec<Callback> = {
            let mut subs = self.subs();
            let callbacks = subs
                .iter()
                .filter(|s| s.event == event)
                .map(|s| s.callback.clone())
                .collect();
            subs.retain(|s| !(s.event == event && s.once));
            callbacks
        };

        for callback in callbacks {
            callback(results);
        }
    }

    fn subscribe(&self, event: BuildEvent, callback: Callback, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subs().push(Subscription {
            id,
            event,
            callback,
            once,
        });
        id
    }

    fn subs(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for BuildEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn results(build_id: i64) -> BuildResults {
        BuildResults {
            build_id,
            diagnostics: Vec::new(),
            has_error: false,
            aborted: false,
            stats: None,
        }
    }

    #[test]
    fn on_receives_matching_events_only() {
        let events = BuildEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        events.on(BuildEvent::Rebuild, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(BuildEvent::Build, &results(0));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        events.emit(BuildEvent::Rebuild, &results(1));
        events.emit(BuildEvent::Rebuild, &results(2));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let events = BuildEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        let id = events.on(BuildEvent::Build, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(BuildEvent::Build, &results(0));
        events.unsubscribe(id);
        events.emit(BuildEvent::Build, &results(1));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn next_delivers_exactly_once() {
        let events = BuildEvents::new();
        let rx = events.next(BuildEvent::Build);

        events.emit(BuildEvent::Build, &results(7));
        events.emit(BuildEvent::Build, &results(8));

        assert_eq!(rx.recv().unwrap().build_id, 7);
        assert!(rx.try_recv().is_err());
    }
}
