//! Diaulos Hardware Abstraction Layer
//!
//! This crate defines the device-layer interface consumed by the
//! target-agnostic transport engine in `diaulos-core`. A chip-specific HAL
//! implements [`uart::UartPort`] over its own register and vector layout;
//! the engine never touches hardware any other way.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / firmware                 │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  diaulos-core (engine)                  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  diaulos-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip-specific │       │ diaulos-hal-  │
//! │     HALs      │       │ mock (tests)  │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

// Re-export key items at crate root for convenience
pub use uart::{BaudDivisor, DataBits, LineConfig, Parity, StopBits, UartPort};
