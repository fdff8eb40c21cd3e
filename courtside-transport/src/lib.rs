//! Transport layer contracts.
//!
//! Defines the traits the cache engine talks through: a request/response
//! [`Transport`] carrying rendered query strings, and a persistent
//! [`EventChannel`] delivering push-invalidation events. Concrete network
//! implementations (HTTP, websockets, reconnect policy) live outside the
//! engine; the mock implementations here back the test suites.

mod channel;
mod error;
mod transport;

pub use channel::EventChannel;
pub use error::{TransportError, TransportResult};
pub use transport::{Transport, mock};
