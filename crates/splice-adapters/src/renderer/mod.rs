//! Template renderer adapters.

mod case;
mod jinja;

pub use jinja::MinijinjaRenderer;
