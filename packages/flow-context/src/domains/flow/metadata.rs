use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flow metadata submitted by a client (the body's `metricsContext`)
///
/// Every field is optional. Keys this type doesn't know are kept in `extra`
/// so a stashed record round-trips whatever the client sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_begin_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_complete_signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlowMetadata {
    /// The record stashed in the cache: this metadata with `service` replaced
    pub fn to_cached_record(&self, service: Option<String>) -> serde_json::Result<Value> {
        let record = FlowMetadata {
            service,
            ..self.clone()
        };
        serde_json::to_value(record)
    }

    /// Drop the signed flow fields after a failed verification
    pub fn strip_flow(&mut self) {
        self.flow_id = None;
        self.flow_begin_time = None;
    }
}

/// Outbound flow event data built by `FlowContext::gather`
///
/// Callers pre-populate whatever they already know; gathering only fills
/// fields that are still empty. Empty fields are omitted when serialized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowEventData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_time: Option<i64>,
    #[serde(rename = "flowBeginTime", skip_serializing_if = "Option::is_none")]
    pub flow_begin_time: Option<i64>,
    #[serde(rename = "flowCompleteSignal", skip_serializing_if = "Option::is_none")]
    pub flow_complete_signal: Option<String>,
    #[serde(rename = "flowType", skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    /// Caller-owned fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlowEventData {
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Fill empty fields from `source`
    ///
    /// `context`, `entrypoint`, `migration` and unknown source keys are never
    /// emitted. With `do_not_track` set the `utm_*` fields stay empty.
    pub fn merge_from(&mut self, source: &FlowMetadata, now: i64, do_not_track: bool) {
        let time = *self.time.get_or_insert(now);

        fill(&mut self.device_id, &source.device_id);
        fill(&mut self.flow_id, &source.flow_id);
        fill(&mut self.flow_begin_time, &source.flow_begin_time);
        fill(&mut self.flow_complete_signal, &source.flow_complete_signal);
        fill(&mut self.flow_type, &source.flow_type);
        fill(&mut self.service, &source.service);

        if let Some(flow_begin_time) = self.flow_begin_time {
            self.flow_time.get_or_insert(flow_time(time, flow_begin_time));
        }

        if do_not_track {
            self.clear_utm();
        } else {
            fill(&mut self.utm_campaign, &source.utm_campaign);
            fill(&mut self.utm_content, &source.utm_content);
            fill(&mut self.utm_medium, &source.utm_medium);
            fill(&mut self.utm_source, &source.utm_source);
            fill(&mut self.utm_term, &source.utm_term);
        }
    }

    /// Drop every `utm_*` field, whoever set it
    pub fn clear_utm(&mut self) {
        self.utm_campaign = None;
        self.utm_content = None;
        self.utm_medium = None;
        self.utm_source = None;
        self.utm_term = None;
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

/// Milliseconds elapsed since the flow began, clamped at zero
pub fn flow_time(time: i64, flow_begin_time: i64) -> i64 {
    time.saturating_sub(flow_begin_time).max(0)
}
