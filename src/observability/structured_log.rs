/// 構造化JSON形式ログ。
use serde_json::{Map, Value, json};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// INFO 以上のイベントを1行 JSON で stderr に出すレイヤー。
pub(crate) struct StructuredLogLayer;

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.insert(field, json!(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, json!(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, json!(value));
    }
}

/// イベントを JSON 1行に整形する。
fn render(event: &Event<'_>) -> Value {
    let mut visitor = JsonVisitor::default();
    event.record(&mut visitor);
    let metadata = event.metadata();
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "level": metadata.level().as_str(),
        "target": metadata.target(),
        "message": visitor.message.unwrap_or_else(|| metadata.name().to_string()),
        "service": "tagmap-worker",
        "fields": visitor.fields,
    })
}

impl<S: Subscriber> Layer<S> for StructuredLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() > Level::INFO {
            return;
        }
        eprintln!("{}", render(event));
    }
}
