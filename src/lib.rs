pub mod address;
pub mod connection;
pub mod error;
pub mod transport;
pub mod utils;

pub use address::{JailAddress, Provenance, JAIL_SEPARATOR};
pub use connection::{JailConnection, OverrideContext, SessionId};
pub use error::JailError;
pub use transport::{
    CommandResult, OpenSshFactory, OpenSshTransport, Transport, TransportConfig, TransportError,
    TransportFactory,
};
