//! Panic capture for the request middleware.
//!
//! By the time a panic reaches the middleware as an unwind payload, the
//! stack that produced it is gone. The hook installed here records the
//! backtrace on the panicking thread, and the middleware collects it right
//! after `catch_unwind` on that same thread.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Chain a hook that records the backtrace of every panic.
///
/// The previously installed hook still runs. Calling this more than once
/// installs the hook only once.
pub fn install_hook() {
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Take the backtrace recorded for the most recent panic on this thread.
pub fn take_trace() -> Option<String> {
    LAST_TRACE.with(|slot| slot.borrow_mut().take())
}

/// Best-effort text of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_records_trace_for_thread() {
        install_hook();
        let result = std::panic::catch_unwind(|| panic!("recorded"));
        let payload = result.unwrap_err();

        assert_eq!(payload_message(payload.as_ref()), "recorded");
        let trace = take_trace().expect("trace recorded by hook");
        assert!(!trace.is_empty());
        assert!(take_trace().is_none());
    }

    #[test]
    fn test_formatted_payload() {
        let result = std::panic::catch_unwind(|| panic!("value {}", 7));
        assert_eq!(payload_message(result.unwrap_err().as_ref()), "value 7");
    }
}
