//! Structured logging hooks for the adaptive paths (column planning and
//! back-end selection). The `log_metric!` macro emits one key-value line
//! through the `log` facade so a host that cares can watch the engine's
//! decisions without a debugger.

/// Emits one structured metric line at debug level.
#[doc(hidden)]
pub fn emit(line: &str) {
    log::debug!("JCO_METRIC: {{ {} }}", line);
}

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use jco_core::log_metric;
/// let windows = 4;
/// log_metric!("event" = "hybrid_select", "mode" = "windowed", "windows" = &windows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::observability::emit(&parts.join(", "));
        }
    };
}
