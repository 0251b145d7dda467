//! # ambed
//!
//! Control plane of an AMBE vocoder transcoding daemon.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          CODEC CLIENTS                               │
//! │     AMBEDOS (open)      AMBEDCS (close)      AMBEDPING (keep-alive)  │
//! └──────────────────────────────┬───────────────────────────────────────┘
//!                                │ UDP control port (10100)
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 Controller worker thread (controller)                │
//! │  ┌──────────────┐    ┌───────────────────┐    ┌──────────────────┐   │
//! │  │ bounded recv │───▶│ protocol::packet  │───▶│ StreamLifecycle  │   │
//! │  │   (20 ms)    │    │ decode / encode   │    │ id allocation    │   │
//! │  └──────────────┘    └───────────────────┘    └────────┬─────────┘   │
//! │         ▲                                              │             │
//! │         │ AMBEDSTD / AMBEDBUSY / AMBEDPONG             ▼             │
//! │         └──────────────────────────────┐    ┌──────────────────┐     │
//! │                                        │    │   StreamTable    │◀────┼── shutdown
//! │                                        │    │ (single mutex)   │     │   (owner thread)
//! │                                        │    └────────┬─────────┘     │
//! └────────────────────────────────────────┼─────────────┼───────────────┘
//!                                          │             ▼
//!                                          │   ┌───────────────────────┐
//!                                          │   │ Stream N              │
//!                                          │   │ port = base + N       │
//!                                          │   │ vocoder channel lease │
//!                                          │   └───────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod protocol;
pub mod stream;

pub use controller::{Controller, ControllerState};
pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Well-known UDP control port of the transcoder
    pub const TRANSCODER_PORT: u16 = 10100;

    /// Maximum number of concurrent streams
    pub const MAX_STREAMS: u16 = 99;

    /// Bounded wait of one receive on the control socket, in milliseconds
    pub const RECEIVE_TIMEOUT_MS: u64 = 20;

    /// A stream with no traffic for this long reports inactive, in milliseconds
    pub const STREAM_ACTIVITY_TIMEOUT_MS: u64 = 3000;

    /// Default number of vocoder channels in the pool
    pub const DEFAULT_VOCODER_CHANNELS: usize = 4;

    /// Largest datagram read from any socket
    pub const MAX_PACKET_SIZE: usize = 1472; // MTU - IP/UDP headers
}
