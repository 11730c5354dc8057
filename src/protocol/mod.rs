//! Hub wire protocol: command framing, event decoding, the status model, and
//! the capability snapshot. Everything in this module is pure and stateless;
//! I/O lives behind the transport seam.

pub mod capabilities;
pub mod codec;
pub mod status;
pub mod uuids;

pub use capabilities::HubCapabilities;
pub use codec::{Command, Event};
pub use status::{HubStatus, RevisionDependent, StatusFlags};
