//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter  | Implements                                  | Connects to            |
//! |----------|---------------------------------------------|------------------------|
//! | `sim`    | `OutputPin`, `DelayNs`, every `ports` trait | In-memory device models|
//! | `board`  | Hub bring-up from `ACTIVE_SENSORS`          | `sim` devices          |
//!
//! Board HAL adapters for the firmware target live with the target build.

#[cfg(not(target_os = "espidf"))]
pub mod board;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
