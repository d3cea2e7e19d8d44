//! Shared test utilities: recording/batching updaters and log capture

#![allow(dead_code)]

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use blinc_component::{
    MountStatus, StateCell, StateMap, StateUpdate, Stateful, UnitId, UpdateCallback,
    UpdateSource, Updater,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

/// Whether the no-op updater logs in this build
pub const NOOP_WARNINGS: bool = cfg!(any(debug_assertions, feature = "diagnostics"));

/// Number of no-op warnings `requests` dropped requests produce in this build
pub fn expected_warnings(requests: usize) -> usize {
    if NOOP_WARNINGS {
        requests
    } else {
        0
    }
}

/// Build a state map from a `json!` object literal
pub fn fields(value: Value) -> StateMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =============================================================================
// RECORDING UPDATER
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    State,
    Force,
}

/// One forwarded request as seen by the updater
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub unit: UnitId,
    pub update: Option<StateUpdate>,
    pub has_callback: bool,
    pub source: UpdateSource,
    pub shallow_comparable: bool,
}

/// Records every request and never applies anything
#[derive(Default)]
pub struct RecordingUpdater {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingUpdater {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Updater for RecordingUpdater {
    fn enqueue_state_update(
        &self,
        unit: &dyn Stateful,
        update: Option<StateUpdate>,
        callback: Option<UpdateCallback>,
        source: UpdateSource,
    ) {
        self.calls.lock().push(RecordedCall {
            kind: CallKind::State,
            unit: unit.id(),
            update,
            has_callback: callback.is_some(),
            source,
            shallow_comparable: unit.is_shallow_comparable(),
        });
    }

    fn enqueue_force_update(
        &self,
        unit: &dyn Stateful,
        callback: Option<UpdateCallback>,
        source: UpdateSource,
    ) {
        self.calls.lock().push(RecordedCall {
            kind: CallKind::Force,
            unit: unit.id(),
            update: None,
            has_callback: callback.is_some(),
            source,
            shallow_comparable: unit.is_shallow_comparable(),
        });
    }

    fn is_mounted(&self, _unit: &dyn Stateful) -> MountStatus {
        MountStatus::Unknown
    }
}

// =============================================================================
// BATCHING UPDATER
// =============================================================================

struct Pending {
    unit: UnitId,
    cell: StateCell,
    props: Value,
    context: Value,
    update: Option<StateUpdate>,
    forced: bool,
    callback: Option<UpdateCallback>,
}

/// Queues requests and applies them in order on `flush`
#[derive(Default)]
pub struct BatchingUpdater {
    queue: Mutex<Vec<Pending>>,
    mounted: Mutex<HashSet<UnitId>>,
    renders: Mutex<Vec<(UnitId, bool)>>,
}

impl BatchingUpdater {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mount(&self, unit: &dyn Stateful) {
        self.mounted.lock().insert(unit.id());
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Renders performed so far as `(unit, forced)`
    pub fn renders(&self) -> Vec<(UnitId, bool)> {
        self.renders.lock().clone()
    }

    /// Apply every queued request, then run callbacks in request order
    pub fn flush(&self) {
        let batch: Vec<Pending> = std::mem::take(&mut *self.queue.lock());
        let mut callbacks = Vec::new();
        let mut rendered: Vec<(UnitId, bool)> = Vec::new();

        for pending in batch {
            if let Some(update) = &pending.update {
                pending.cell.apply(update, &pending.props, &pending.context);
            }
            match rendered.iter_mut().find(|(id, _)| *id == pending.unit) {
                Some(entry) => entry.1 |= pending.forced,
                None => rendered.push((pending.unit, pending.forced)),
            }
            if let Some(callback) = pending.callback {
                callbacks.push(callback);
            }
        }

        self.renders.lock().extend(rendered);
        for callback in callbacks {
            callback();
        }
    }

    fn push(&self, unit: &dyn Stateful, update: Option<StateUpdate>, forced: bool, callback: Option<UpdateCallback>) {
        self.queue.lock().push(Pending {
            unit: unit.id(),
            cell: unit.state_cell().clone(),
            props: unit.props().clone(),
            context: unit.context().clone(),
            update,
            forced,
            callback,
        });
    }
}

impl Updater for BatchingUpdater {
    fn enqueue_state_update(
        &self,
        unit: &dyn Stateful,
        update: Option<StateUpdate>,
        callback: Option<UpdateCallback>,
        _source: UpdateSource,
    ) {
        self.push(unit, update, false, callback);
    }

    fn enqueue_force_update(
        &self,
        unit: &dyn Stateful,
        callback: Option<UpdateCallback>,
        _source: UpdateSource,
    ) {
        self.push(unit, None, true, callback);
    }

    fn is_mounted(&self, unit: &dyn Stateful) -> MountStatus {
        if self.mounted.lock().contains(&unit.id()) {
            MountStatus::Mounted
        } else {
            MountStatus::NotMounted
        }
    }
}

// =============================================================================
// LOG CAPTURE
// =============================================================================

#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Events captured while a closure ran
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == Level::WARN)
            .map(|event| event.message.clone())
            .collect()
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logs.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

/// Run `f` with a thread-scoped subscriber and return what it logged
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = Registry::default().with(CaptureLayer { logs: logs.clone() });
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}
