use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Viewport and pointer notifications delivered to a renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewEvent {
    Resize { width: f32, height: f32, dpr: f32 },
    /// Surface-relative logical coordinates
    PointerMove { x: f32, y: f32 },
    PointerLeave,
}

type Queues<E> = RefCell<Vec<(u64, VecDeque<E>)>>;

/// Events kept per subscription before the oldest are dropped.
pub const DEFAULT_QUEUE_LIMIT: usize = 256;

/// Fan-out of host events to scoped subscribers.
pub struct EventHub<E> {
    queues: Rc<Queues<E>>,
    next_id: std::cell::Cell<u64>,
    limit: usize,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self {
            queues: Rc::new(RefCell::new(Vec::new())),
            next_id: std::cell::Cell::new(0),
            limit: DEFAULT_QUEUE_LIMIT,
        }
    }
}

impl<E: Clone> EventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub whose subscriptions hold at most `limit` undrained events.
    pub fn with_queue_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    /// Start listening. The listener is detached when the subscription drops.
    #[must_use = "dropping the subscription detaches it immediately"]
    pub fn subscribe(&self) -> Subscription<E> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.queues.borrow_mut().push((id, VecDeque::new()));
        Subscription {
            id,
            queues: Rc::downgrade(&self.queues),
        }
    }

    /// Deliver `event` to every live subscription. Returns how many received it.
    ///
    /// A subscription that never drains keeps only its newest events.
    pub fn emit(&self, event: E) -> usize {
        let mut queues = self.queues.borrow_mut();
        for (_, queue) in queues.iter_mut() {
            if queue.len() >= self.limit {
                queue.pop_front();
            }
            queue.push_back(event.clone());
        }
        queues.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.borrow().len()
    }
}

/// A live listener registration.
pub struct Subscription<E> {
    id: u64,
    queues: Weak<Queues<E>>,
}

impl<E> Subscription<E> {
    /// Next queued event, oldest first.
    pub fn next(&self) -> Option<E> {
        let queues = self.queues.upgrade()?;
        let mut queues = queues.borrow_mut();
        let event = queues
            .iter_mut()
            .find(|(id, _)| *id == self.id)
            .and_then(|(_, queue)| queue.pop_front());
        event
    }

    /// Everything queued since the last drain.
    pub fn drain(&self) -> Vec<E> {
        std::iter::from_fn(|| self.next()).collect()
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(queues) = self.queues.upgrade() {
            queues.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_in_order() {
        let hub = EventHub::new();
        let sub = hub.subscribe();
        hub.emit(ViewEvent::PointerMove { x: 1.0, y: 2.0 });
        hub.emit(ViewEvent::PointerLeave);
        assert_eq!(
            sub.drain(),
            vec![ViewEvent::PointerMove { x: 1.0, y: 2.0 }, ViewEvent::PointerLeave]
        );
        assert_eq!(sub.next(), None);
    }

    #[test]
    fn drop_releases_listener() {
        let hub: EventHub<ViewEvent> = EventHub::new();
        let a = hub.subscribe();
        {
            let _b = hub.subscribe();
            assert_eq!(hub.subscriber_count(), 2);
        }
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.emit(ViewEvent::PointerLeave), 1);
        drop(a);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn release_on_early_return() {
        fn listen_once(hub: &EventHub<ViewEvent>) -> Result<(), &'static str> {
            let sub = hub.subscribe();
            sub.next().ok_or("nothing queued")?;
            Ok(())
        }
        let hub = EventHub::new();
        assert!(listen_once(&hub).is_err());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn undrained_queue_keeps_newest_events() {
        let hub = EventHub::with_queue_limit(3);
        let sub = hub.subscribe();
        for i in 0..10 {
            hub.emit(ViewEvent::PointerMove { x: i as f32, y: 0.0 });
        }
        let xs: Vec<f32> = sub
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::PointerMove { x, .. } => Some(x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![7.0, 8.0, 9.0]);

        let hub = EventHub::new();
        let sub = hub.subscribe();
        for _ in 0..DEFAULT_QUEUE_LIMIT + 50 {
            hub.emit(ViewEvent::PointerLeave);
        }
        assert_eq!(sub.drain().len(), DEFAULT_QUEUE_LIMIT);
    }

    #[test]
    fn subscription_outliving_hub_is_inert() {
        let hub = EventHub::new();
        let sub = hub.subscribe();
        drop(hub);
        assert_eq!(sub.next(), None::<ViewEvent>);
    }
}
