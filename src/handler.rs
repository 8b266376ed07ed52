//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The route table holds handlers of *different* types in one `Vec<Route>`,
//! so each one is hidden behind a trait object:
//!
//! ```text
//! fn get_user(w: &mut ResponseWriter, r: &Request) -> Result<(), Error>  ← user writes this
//!        ↓ Router::new().get("/users/:id", get_user)
//! get_user.into_boxed_handler()                  ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(get_user))                  ← stored as BoxedHandler
//!        ↓
//! handler.call(&mut writer, &request)            ← one virtual call per request
//! ```
//!
//! Handlers are plain synchronous functions: they write into the
//! [`ResponseWriter`] and return. A handler may return `()` or any
//! `Result<(), E>` whose error converts into [`BoxError`]; an `Err` is turned
//! into a 500 exactly like a panic.

use std::sync::Arc;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::ResponseWriter;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a handler may return.
pub trait Outcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl Outcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> Outcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, w: &mut ResponseWriter, r: &Request) -> Result<(), BoxError>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the signature:
///
/// ```text
/// Fn(&mut ResponseWriter, &Request) -> impl Outcome
/// ```
///
/// Closures need their argument types spelled out
/// (`|w: &mut ResponseWriter, r: &Request| ...`) so the compiler picks the
/// signature that works for every borrow.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, R> private::Sealed for F
where
    F: Fn(&mut ResponseWriter, &Request) -> R + Send + Sync + 'static,
    R: Outcome,
{
}

impl<F, R> Handler for F
where
    F: Fn(&mut ResponseWriter, &Request) -> R + Send + Sync + 'static,
    R: Outcome,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut ResponseWriter, &Request) -> R,
    R: Outcome,
{
    fn call(&self, w: &mut ResponseWriter, r: &Request) -> Result<(), BoxError> {
        (self.0)(w, r).into_result()
    }
}
