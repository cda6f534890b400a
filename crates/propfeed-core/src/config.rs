use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let user_agent = or_default("PROPFEED_USER_AGENT", "propfeed/0.1 (listing-aggregator)");
    let request_timeout_secs = parse_u64("PROPFEED_HTTP_TIMEOUT_SECS", "20")?;
    let max_retries = parse_u32("PROPFEED_HTTP_MAX_RETRIES", "5")?;
    let backoff_base = parse_f64("PROPFEED_HTTP_BACKOFF_BASE", "1.8")?;
    let rate_gap_default_ms = parse_u64("PROPFEED_RATE_GAP_DEFAULT_MS", "1500")?;

    let max_results_per_site = parse_usize("PROPFEED_MAX_RESULTS", "2")?;
    let search_region = or_default("PROPFEED_SEARCH_REGION", "au-en");
    let search_max_retries = parse_u32("PROPFEED_SEARCH_MAX_RETRIES", "3")?;
    let search_pacing_delay_ms = parse_u64("PROPFEED_SEARCH_PACING_DELAY_MS", "1000")?;

    let proxy_url = lookup("PROPFEED_PROXY_URL").ok().filter(|v| !v.is_empty());

    Ok(AppConfig {
        user_agent,
        request_timeout_secs,
        max_retries,
        backoff_base,
        rate_gap_default_ms,
        max_results_per_site,
        search_region,
        search_max_retries,
        search_pacing_delay_ms,
        proxy_url,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
