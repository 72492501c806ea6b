//! Tracing setup.
//!
//! LOG_LEVEL holds EnvFilter directives. Our targets are `readfit_backend`, `session`,
//! `mission` and `store`; tower-http request spans come from the router's TraceLayer.
//! LOG_FORMAT=json switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,readfit_backend=debug,session=debug,mission=debug,store=info,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  pub fn parse(raw: Option<&str>) -> Self {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
      Some("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

fn filter_from_env() -> EnvFilter {
  EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing() {
  let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter_from_env())
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  let installed = match format {
    LogFormat::Json => builder.json().try_init(),
    LogFormat::Pretty => builder.try_init(),
  };
  if installed.is_ok() {
    tracing::debug!(target: "readfit_backend", ?format, "Tracing initialized");
  }
}
