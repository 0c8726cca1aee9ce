use crate::core::prelude::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Vector,
    Matrix,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Vector => "vector",
            OperationKind::Matrix => "matrix",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vector" => Ok(OperationKind::Vector),
            "matrix" => Ok(OperationKind::Matrix),
            other => bail!("unknown operation type: `{other}`"),
        }
    }
}

/// Emitted by an engine once per completed operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationEvent {
    pub kind: OperationKind,
    pub operation: String,
    pub input_a: Value,
    /// `None` for unary operations.
    pub input_b: Option<Value>,
    pub result: Value,
    pub duration_ms: f64,
}

/// The vectors currently on screen. `result` is `None` when only the operands changed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VectorUpdate {
    pub a: Vec3,
    pub b: Vec3,
    pub result: Option<OpResult>,
}

pub trait OperationListener {
    fn on_operation(&mut self, event: &OperationEvent);
}

pub trait VectorListener {
    fn on_vector_update(&mut self, update: &VectorUpdate);
}

static NEXT_LISTENER_ID: AtomicUsize = AtomicUsize::new(0);
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ListenerId(usize);

impl ListenerId {
    fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

type OperationFunc = dyn FnMut(&OperationEvent);
type VectorFunc = dyn FnMut(&VectorUpdate);

/// Synchronous fan-out from the engines to their consumers.
///
/// Listeners are called in subscription order, on the publishing thread, before `publish_*`
/// returns.
#[derive(Default)]
pub struct EventBus {
    operation_listeners: Vec<(ListenerId, Box<OperationFunc>)>,
    vector_listeners: Vec<(ListenerId, Box<VectorFunc>)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_operation<F>(&mut self, func: F) -> ListenerId
    where
        F: FnMut(&OperationEvent) + 'static,
    {
        let id = ListenerId::next();
        self.operation_listeners.push((id, Box::new(func)));
        id
    }
    pub fn on_vector_update<F>(&mut self, func: F) -> ListenerId
    where
        F: FnMut(&VectorUpdate) + 'static,
    {
        let id = ListenerId::next();
        self.vector_listeners.push((id, Box::new(func)));
        id
    }

    pub fn subscribe_operations<L: OperationListener + 'static>(
        &mut self,
        listener: UniqueShared<L>,
    ) -> ListenerId {
        self.on_operation(move |event| listener.get().on_operation(event))
    }
    pub fn subscribe_vector_updates<L: VectorListener + 'static>(
        &mut self,
        listener: UniqueShared<L>,
    ) -> ListenerId {
        self.on_vector_update(move |update| listener.get().on_vector_update(update))
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listener_count();
        self.operation_listeners.retain(|(other, _)| *other != id);
        self.vector_listeners.retain(|(other, _)| *other != id);
        self.listener_count() != before
    }

    pub fn listener_count(&self) -> usize {
        self.operation_listeners.len() + self.vector_listeners.len()
    }

    pub fn publish_operation(&mut self, event: &OperationEvent) {
        if self.operation_listeners.is_empty() {
            warn!("no listener for {} operation `{}`", event.kind, event.operation);
        }
        for (_, func) in &mut self.operation_listeners {
            func(event);
        }
    }

    pub fn publish_vector_update(&mut self, update: &VectorUpdate) {
        for (_, func) in &mut self.vector_listeners {
            func(update);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("operation_listeners", &self.operation_listeners.len())
            .field("vector_listeners", &self.vector_listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(operation: &str) -> OperationEvent {
        OperationEvent {
            kind: OperationKind::Vector,
            operation: operation.to_string(),
            input_a: Value::Vector(Vec3::x_axis()),
            input_b: None,
            result: Value::Scalar(1.0),
            duration_ms: 0.0,
        }
    }

    #[derive(Default)]
    struct Recorder {
        operations: Vec<String>,
        updates: usize,
    }

    impl OperationListener for Recorder {
        fn on_operation(&mut self, event: &OperationEvent) {
            self.operations.push(event.operation.clone());
        }
    }
    impl VectorListener for Recorder {
        fn on_vector_update(&mut self, _update: &VectorUpdate) {
            self.updates += 1;
        }
    }

    #[test]
    fn listeners_receive_events_in_order() {
        let mut bus = EventBus::new();
        let recorder = UniqueShared::new(Recorder::default());
        let seen = UniqueShared::new(Vec::new());
        bus.subscribe_operations(recorder.clone());
        bus.subscribe_vector_updates(recorder.clone());
        {
            let seen = seen.clone();
            bus.on_operation(move |e| seen.get().push(format!("closure:{}", e.operation)));
        }

        bus.publish_operation(&event("magnitude"));
        bus.publish_operation(&event("dot"));
        bus.publish_vector_update(&VectorUpdate {
            a: Vec3::zero(),
            b: Vec3::zero(),
            result: None,
        });

        assert_eq!(recorder.get().operations, vec!["magnitude", "dot"]);
        assert_eq!(recorder.get().updates, 1);
        assert_eq!(seen.clone_inner(), vec!["closure:magnitude", "closure:dot"]);
    }

    #[test]
    fn unsubscribe() {
        let mut bus = EventBus::new();
        let recorder = UniqueShared::new(Recorder::default());
        let id = bus.subscribe_operations(recorder.clone());
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish_operation(&event("sum"));
        assert!(recorder.get().operations.is_empty());
    }

    #[test]
    fn kind_round_trip() {
        assert_eq!("matrix".parse::<OperationKind>().unwrap(), OperationKind::Matrix);
        assert_eq!(OperationKind::Vector.to_string(), "vector");
        assert!("all".parse::<OperationKind>().is_err());
        assert_eq!(serde_json::to_string(&OperationKind::Matrix).unwrap(), "\"matrix\"");
    }
}
