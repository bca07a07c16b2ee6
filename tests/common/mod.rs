//! Integration test common infrastructure.
//!
//! Provides a `Session` harness over an in-memory database and a scripted
//! IRC server for driving the real client over TCP.

pub mod server;
pub mod session;

#[allow(unused_imports)]
pub use server::FakeIrcd;
#[allow(unused_imports)]
pub use session::{TestSession, notices_to, user};
