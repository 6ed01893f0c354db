//! The warning sink: non-fatal diagnostics (unknown element symbols, GRO
//! index overflow, truncated fields) always go through `tracing::warn!`, and
//! can additionally be observed by an embedder-supplied callback.

use std::sync::{OnceLock, RwLock};

type Sink = Box<dyn Fn(&str) + Send + Sync>;

static SINK: OnceLock<RwLock<Option<Sink>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Sink>> {
    SINK.get_or_init(|| RwLock::new(None))
}

/// Install a callback to receive every warning raised while reading or
/// writing, in addition to the `tracing::warn!` emission. Pass `None` to
/// remove a previously installed callback.
pub fn set_warning_sink<F>(sink: Option<F>)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let mut slot = slot().write().expect("warning sink poisoned");
    *slot = sink.map(|f| Box::new(f) as Sink);
}

/// Raise a non-fatal warning: always logged via `tracing`, and forwarded to
/// the installed sink, if any.
pub fn warn(message: impl AsRef<str>) {
    let message = message.as_ref();
    tracing::warn!("{message}");
    if let Some(sink) = slot().read().expect("warning sink poisoned").as_ref() {
        sink(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sink_receives_warnings() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        set_warning_sink(Some(move |msg: &str| {
            seen_clone.lock().unwrap().push(msg.to_string());
        }));
        warn("unknown element: Zz");
        assert_eq!(seen.lock().unwrap().as_slice(), ["unknown element: Zz"]);
        set_warning_sink::<fn(&str)>(None);
    }
}
