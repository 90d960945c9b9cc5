//! # Loaded Module
//!
//! The rendering boundary of the crate: what a UI surface should display for a value that
//! is loaded asynchronously.
//!
//! The controller never produces markup. Every render effect of the state machine is
//! published as a [`LoadView`], and it is up to the host to turn it into pixels, text or
//! DOM nodes.
//!
//! ## Core Concepts
//!
//! - [`Loadable`]: bound for values a controller can manage
//! - [`LoadView`]: what should currently be displayed (placeholder, value, or error)

mod view;

pub use view::LoadView;

/// A value that can be loaded, compared against the previously loaded value, and shared
/// with the rendering side.
///
/// Equality is what suppresses redundant renders: a refresh returning a value equal to
/// the one already held does not re-render nor notify.
///
/// Implemented for every type satisfying the bounds.
pub trait Loadable: Clone + PartialEq + Send + Sync + 'static {}
impl<T: Clone + PartialEq + Send + Sync + 'static> Loadable for T {}
