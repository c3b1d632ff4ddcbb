//! Protocol engines for the RDT lab: the stop-and-wait sender, the
//! alternating-bit receiver, and the transport seam both plug into.
//!
//! The engines are synchronous and single-threaded per role. The only
//! blocking point is the sender's timed wait for an acknowledgment;
//! everything else runs to completion on the caller's thread.

pub mod receiver;
pub mod sender;
pub mod transport;

pub use receiver::{Inbound, Receiver, ReceiverEngine};
pub use sender::{Delivery, SendError, Sender};
pub use transport::{Transport, TransportError};
