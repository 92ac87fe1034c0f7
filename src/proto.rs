//! Generated protobuf messages and gRPC service definitions.
//!
//! The message and service types below are generated at build time by
//! `build.rs` from the `.proto` schema under `proto/angzarr/`.

#![allow(clippy::large_enum_variant)]

include!(concat!(env!("OUT_DIR"), "/angzarr.rs"));
