//! Public extension contracts implemented by the surrounding application.
//!
//! The crate exposes traits without opinionated implementations so host applications can
//! bring their own navigation layer. The client only promises when a hook fires, never how
//! the application reacts to it.

pub mod login_redirect;

pub use login_redirect::*;
