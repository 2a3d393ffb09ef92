//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                     |
//! |----------------|--------------|---------------------------------|
//! | `log_mesh`     | MeshPort     | Serial log output               |
//! | `packet_pool`  | PacketPool   | Heap, bounded                   |
//! | `time`         | ClockPort    | ESP32 system timer / host clock |
//!
//! The sensor port is implemented directly by
//! [`Scd30`](crate::sensors::scd30::Scd30).

pub mod log_mesh;
pub mod packet_pool;
pub mod time;
