use std::fmt::Write as _;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, Layer, EnvFilter, Registry};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

const DEFAULT_FILTER: &str = "warn,zilk_backend=info,zilk_shared=warn,tower_http=info";

// Our own crates may log below INFO; everyone else stops at INFO
const OWN_TARGETS: [&str; 2] = ["zilk_backend", "zilk_shared"];

/// Message plus any structured fields, e.g. `latency` and `status` from the HTTP trace layer.
#[derive(Default)]
struct EventLine {
    message: String,
    fields: String,
}

impl EventLine {
    fn push_field(&mut self, name: &str, value: &str) {
        // Bridged `log` records carry their call site as `log.*` fields
        if name.starts_with("log.") {
            return;
        }
        let _ = write!(self.fields, " {}={}", name, value);
    }

    fn render(&self) -> Option<String> {
        if self.message.is_empty() && self.fields.is_empty() {
            return None;
        }
        Some(format!("{}{}", self.message, self.fields).trim_start().to_string())
    }
}

impl Visit for EventLine {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), &format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), value);
        }
    }
}

fn is_own_target(target: &str) -> bool {
    OWN_TARGETS.iter().any(|own| target.starts_with(own))
}

fn format_line(level: Level, target: &str, line: &str, timestamp: &str) -> Option<String> {
    if target.starts_with("sqlx") {
        return None;
    }

    match level {
        Level::ERROR => Some(format!("[{}] ❌ Error: {} - {}", timestamp, target, line)),
        Level::WARN => Some(format!("[{}] ⚠️ Warning: {} - {}", timestamp, target, line)),
        Level::INFO => Some(format!("[{}] ℹ️ {} - {}", timestamp, target, line)),
        _ if is_own_target(target) => Some(format!("[{}] 🔄 {} - {}", timestamp, target, line)),
        _ => None,
    }
}

struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut line = EventLine::default();
        event.record(&mut line);
        let Some(line) = line.render() else {
            return;
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let level = *metadata.level();

        if let Some(output) = format_line(level, metadata.target(), &line, &timestamp) {
            if level <= Level::WARN {
                eprintln!("{}", output);
            } else {
                println!("{}", output);
            }
        }
    }
}

/// Installs the global subscriber and bridges `log` records from the shared crate.
/// `RUST_LOG` overrides the default filter.
pub fn setup() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(ConsoleLayer);

    subscriber.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_only_for_own_targets() {
        assert!(format_line(Level::DEBUG, "zilk_shared::prize_wheel", "landed", "t").is_some());
        assert!(format_line(Level::TRACE, "zilk_backend::routes", "x", "t").is_some());
        assert!(format_line(Level::DEBUG, "hyper::proto", "x", "t").is_none());
        assert!(format_line(Level::INFO, "tower_http::trace", "x", "t").is_some());
    }

    #[test]
    fn test_sqlx_is_silenced() {
        assert!(format_line(Level::ERROR, "sqlx::query", "slow", "t").is_none());
    }

    #[test]
    fn test_line_format() {
        assert_eq!(
            format_line(Level::WARN, "zilk_backend", "Skipping deal", "12:00").as_deref(),
            Some("[12:00] ⚠️ Warning: zilk_backend - Skipping deal")
        );
    }

    #[test]
    fn test_event_line_keeps_fields() {
        let mut line = EventLine::default();
        line.message = "finished processing request".to_string();
        line.push_field("latency", "3 ms");
        line.push_field("log.target", "ignored");
        line.push_field("status", "200");
        assert_eq!(line.render().as_deref(), Some("finished processing request latency=3 ms status=200"));

        assert_eq!(EventLine::default().render(), None);
    }
}
