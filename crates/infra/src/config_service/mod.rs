//! Remote configuration service client
//!
//! - [`transport`]: HTTP/JSON transport and its connector
//! - [`reader`]: one round-trip with fingerprint de-duplication
//! - [`monitor`]: the data / err / quit channel triple
//! - [`notifier`]: the long-lived poller publishing on a monitor channel

pub mod monitor;
pub mod notifier;
pub mod reader;
pub mod transport;

pub use monitor::{MonitorChannel, MonitorReceiver, MonitorSender};
pub use notifier::ConfigNotifier;
pub use reader::ConfigReader;
pub use transport::{HttpConfigTransport, HttpTransportConnector};
