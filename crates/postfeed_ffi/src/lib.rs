//! Flutter-facing bindings for `postfeed_core`.

pub mod api;
