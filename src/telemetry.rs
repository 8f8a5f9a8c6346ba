use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Dependencies stay at this level unless `APP_LOG_LEVEL` names them.
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directive}'")]
    Filter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expands a bare level into a filter scoped to this crate's training and
/// assessment events; full directive lists are used as given.
pub fn default_directive(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("{DEPENDENCY_LEVEL},{}={level}", env!("CARGO_CRATE_NAME"))
    }
}

pub fn filter_for(level: &str) -> Result<EnvFilter, TelemetryError> {
    let directive = default_directive(level);
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::Filter { directive, source })
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_for(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_scopes_to_the_triage_crate() {
        assert_eq!(default_directive("info"), "warn,vet_triage=info");
        assert_eq!(default_directive(" debug "), "warn,vet_triage=debug");
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            default_directive("vet_triage=trace,axum=info"),
            "vet_triage=trace,axum=info"
        );
    }

    #[test]
    fn invalid_level_reports_the_expanded_directive() {
        match filter_for("loud") {
            Err(TelemetryError::Filter { directive, .. }) => {
                assert_eq!(directive, "warn,vet_triage=loud")
            }
            other => panic!("expected filter error, got {other:?}"),
        }
        assert!(filter_for("info").is_ok());
    }
}
