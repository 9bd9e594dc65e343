use std::{any::Any, backtrace::Backtrace, panic::PanicHookInfo};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// `RUST_LOG` overrides the configured filter when it parses.
pub fn init_tracing(cfg: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.rust_log)
            .with_context(|| format!("invalid logging.rust_log filter '{}'", cfg.rust_log))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("tracing subscriber already installed")?;

    std::panic::set_hook(Box::new(log_panic));
    Ok(())
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let message = panic_message(info.payload());
    let location = info
        .location()
        .map(|location| location.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    tracing::error!(
        panic = message,
        %location,
        backtrace = %Backtrace::capture(),
        "panic"
    );
}

/// Text carried by a panic payload; the module loader reports it too.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::panic_message;

    #[test]
    fn extracts_static_and_formatted_payloads() {
        let fixed = std::panic::catch_unwind(|| panic!("fixed")).unwrap_err();
        let formatted = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        let opaque = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();

        assert_eq!(panic_message(fixed.as_ref()), "fixed");
        assert_eq!(panic_message(formatted.as_ref()), "code 7");
        assert_eq!(panic_message(opaque.as_ref()), "unknown panic");
    }
}
