use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// `verbosity` maps to a fallback level used only when `RUST_LOG` (or
/// whatever the ambient env filter picks up) isn't set: 0 = warn, 1 = info,
/// 2 = debug, 3+ = trace. `json_logs` switches the writer to structured JSON
/// lines, for callers that pipe this into a log aggregator rather than a
/// terminal.
pub fn init_logger(service_name: &'static str, verbosity: u8, json_logs: bool) {
    LOGGER_INIT.get_or_init(|| {
        let fallback = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true) // <-- shows crate/module path
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        if json_logs {
            builder.json().init();
        } else {
            builder.init();
        }

        tracing::info!(service = service_name, verbosity, json_logs, "logger initialized");
    });
}
