//! Typed endpoint surface. The HTTP transport itself is thin plumbing; this
//! layer owns the request/response contracts it would serve.

pub mod api;
