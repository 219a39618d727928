//! `vigil-middleware` – The Messaging Link
//!
//! Carries results off the node.  The publisher thread only knows the
//! [`Transport`] trait; framing, serialization and delivery are decided
//! here.
//!
//! # Modules
//!
//! - [`transport`] – the [`Transport`] trait and a newline-delimited JSON
//!   implementation for stdout or a file.
//! - [`bus`] – in-process, topic-based broadcast bus (Tokio broadcast
//!   channels) plus a [`BusTransport`][bus::BusTransport] feeding it.
//!
//! # Which transport
//!
//! `vigild` always publishes through [`JsonLinesTransport`] (stdout or a
//! file).  [`BusTransport`] is for hosts that embed `vigil-runtime` in their
//! own process and consume events in-process, and for end-to-end tests of
//! the runtime; it has no config switch in the daemon.

pub mod bus;
pub mod transport;

pub use bus::{BusTransport, EventBus, Topic, TopicReceiver};
pub use transport::{JsonLinesTransport, Transport};
