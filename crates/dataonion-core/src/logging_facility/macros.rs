//! Lifecycle logging macros
//!
//! Every lifecycle event carries `component`, `op` and `event`; end events
//! add `duration_ms`, error events add `err_kind` and `err_code`. Extra
//! fields such as `context_key` follow as ordinary `tracing` fields.

/// Log the start of an operation
///
/// ```
/// # use dataonion_core::log_op_start;
/// log_op_start!("context_create");
/// log_op_start!("context_create", context_key = "orders");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use dataonion_core::log_op_end;
/// log_op_end!("context_create", duration_ms = 3, context_key = "orders");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        )
    };
}

/// Log the failed end of an operation
///
/// `err` is anything convertible into [`ExError`](crate::errors::ExError);
/// its kind and stable code are logged.
///
/// ```
/// # use dataonion_core::{log_op_error, errors::DataOnionError};
/// let err = DataOnionError::ConfigurationNotFound { key: "orders".to_string() };
/// log_op_error!("context_create", err, duration_ms = 1, context_key = "orders");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__private::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($($field)+)?
        );
    }};
}
