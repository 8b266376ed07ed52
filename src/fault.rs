//! Fault boundary around handler calls.
//!
//! A handler fails in one of two ways: it panics, or it returns `Err`. Both
//! become a [`Fault`] that the dispatcher answers with a 500. The panic hook
//! installed at startup records the panic site and a backtrace for the
//! current thread while a handler is running; panics anywhere else still go
//! to whatever hook was installed before.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::error::{BoxError, Error};

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chains a panic hook that captures traces for contained handler panics.
/// Idempotent.
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }
            let trace = Backtrace::force_capture();
            let text = match info.location() {
                Some(location) => format!("panicked at {location}\n{trace}"),
                None => trace.to_string(),
            };
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(text));
        }));
    });
}

/// A contained handler failure.
#[derive(Clone, Debug)]
pub struct Fault {
    message: String,
    trace: Option<String>,
}

impl Fault {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Panic site and backtrace. Only panics carry one.
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Message and trace, as written to the log and the verbose 500 body.
    pub fn detail(&self) -> String {
        match &self.trace {
            Some(trace) => format!("{}\n\n{trace}", self.message),
            None => self.message.clone(),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_owned()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "handler panicked".to_owned()
        };
        let trace = LAST_TRACE.with(|slot| slot.borrow_mut().take());
        Self { message, trace }
    }

    fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            // `#[error("io: {0}")]` style messages already end with their cause
            let text = cause.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self { message, trace: None }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<io::Error> for Fault {
    fn from(err: io::Error) -> Self {
        Self::from_error(&err)
    }
}

/// Runs `f`, converting a panic or an `Err` into a [`Fault`].
pub(crate) fn contain<F>(f: F) -> Result<(), Fault>
where
    F: FnOnce() -> Result<(), BoxError>,
{
    let outer = CAPTURING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|flag| flag.set(outer));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(Fault::from_error(&*err)),
        Err(payload) => Err(Fault::from_panic(payload)),
    }
}
