//! Purpose: Typed paging over remote dataset rows, shared by the `rowpager` CLI and tests.
//! Exports: `core` (envelope, decoding, cursor, errors) and `api` (client, streams, interleave).
//! Role: Library crate; the binary is a thin harness over `api`.
//! Invariants: The library never reads the process environment; credentials arrive via config.
//! Invariants: Core modules are pure; all network I/O goes through `api::PageFetcher`.
pub mod api;
pub mod core;
