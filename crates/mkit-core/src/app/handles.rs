//! Scoped engine handles.
//!
//! Both guards release their engine resource exactly once: explicitly via
//! `release()`, or on drop (early return, `?`, panic, cancelled future).

use tracing::debug;

use crate::ports::engine::{EngineEvent, EngineTask};

pub struct TaskHandle<T: EngineTask> {
    task: Option<T>,
}

impl<T: EngineTask> TaskHandle<T> {
    pub fn new(task: T) -> Self {
        Self { task: Some(task) }
    }

    /// A released handle reports done.
    pub fn is_done(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_done())
    }

    pub async fn next_event(&mut self) -> Option<EventHandle<T::Event>> {
        let task = self.task.as_mut()?;
        task.wait_for_next_event().await.map(EventHandle::new)
    }

    pub fn is_released(&self) -> bool {
        self.task.is_none()
    }

    pub fn release(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.destroy();
            debug!("task handle released");
        }
    }
}

impl<T: EngineTask> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Live engine event. Releasing consumes the handle, so `serialize` never
/// sees a destroyed event.
pub struct EventHandle<E: EngineEvent> {
    event: E,
}

impl<E: EngineEvent> EventHandle<E> {
    pub fn new(event: E) -> Self {
        Self { event }
    }

    pub fn serialize(&self) -> String {
        self.event.serialize()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<E: EngineEvent> Drop for EventHandle<E> {
    fn drop(&mut self) {
        self.event.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct CountingEvent(Arc<AtomicUsize>);

    impl EngineEvent for CountingEvent {
        fn serialize(&self) -> String {
            r#"{"key":"status.started","value":{}}"#.into()
        }

        fn destroy(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingTask {
        destroyed: Arc<AtomicUsize>,
        events: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EngineTask for CountingTask {
        type Event = CountingEvent;

        fn is_done(&self) -> bool {
            false
        }

        async fn wait_for_next_event(&mut self) -> Option<CountingEvent> {
            Some(CountingEvent(self.events.clone()))
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn task() -> (CountingTask, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let events = Arc::new(AtomicUsize::new(0));
        (
            CountingTask {
                destroyed: destroyed.clone(),
                events: events.clone(),
            },
            destroyed,
            events,
        )
    }

    #[test]
    fn task_release_is_idempotent() {
        let (t, destroyed, _) = task();
        let mut handle = TaskHandle::new(t);
        assert!(!handle.is_done());
        handle.release();
        handle.release();
        drop(handle);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn released_task_reports_done() {
        let (t, _, _) = task();
        let mut handle = TaskHandle::new(t);
        handle.release();
        assert!(handle.is_released());
        assert!(handle.is_done());
    }

    #[tokio::test]
    async fn event_handle_released_on_drop() {
        let (t, destroyed, events) = task();
        {
            let mut handle = TaskHandle::new(t);
            let event = handle.next_event().await.unwrap();
            assert!(event.serialize().contains("status.started"));
        }
        assert_eq!(events.load(Ordering::SeqCst), 1);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn event_released_once_after_serialize() {
        let (t, _, events) = task();
        let mut handle = TaskHandle::new(t);
        let event = handle.next_event().await.unwrap();
        let raw = event.serialize();
        event.release();
        assert!(raw.contains("status.started"));
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }
}
