//! Captures tracing events so tests can assert on structured log fields.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// One captured log event
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl LoggedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Clone, Default)]
pub struct RecordingLayer {
    events: Arc<Mutex<Vec<LoggedEvent>>>,
}

impl RecordingLayer {
    pub fn events(&self) -> Vec<LoggedEvent> {
        self.events.lock().expect("recorded events").clone()
    }

    pub fn at(&self, level: Level) -> Vec<LoggedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }

    /// Route this thread's events to the recorder until the guard drops
    pub fn capture(&self) -> DefaultGuard {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

impl<S: Subscriber> Layer<S> for RecordingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        self.events.lock().expect("record event").push(LoggedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}
