//! Ports - 抽象化レイヤー
//!
//! The runner only talks to the outside world through these traits:
//! - `Work`: derive requests, locate their archive, do the work
//! - `StatusStore`: exclusive, transactional access to a status record
//! - `Clock` / `IdGenerator`: time and attempt IDs, swappable in tests

pub mod clock;
pub mod id_generator;
pub mod status_store;
pub mod work;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::status_store::{StatusSession, StatusStore, StoreError};
pub use self::work::Work;
