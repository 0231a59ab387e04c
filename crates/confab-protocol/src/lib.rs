//! Wire format for the Confab session protocol.
//!
//! Both directions speak JSON text frames. Inbound frames are decoded
//! tolerantly into [`Envelope`]; outbound frames are built from the typed
//! [`ClientEnvelope`] enum with the session identifier attached at encode
//! time.

pub mod envelope;
pub mod error;
pub mod outbound;

pub use envelope::Envelope;
pub use error::ProtocolError;
pub use outbound::{encode_with_session, ClientEnvelope};
