//! Driver-facing dial adapter.
//!
//! SQL drivers that accept a custom dial hook call it with the host and
//! port they were configured with. [`Dialer`] satisfies that shape: it
//! ignores the driver-supplied address (the real endpoint comes from the
//! control plane) apart from a mismatch warning, and returns the
//! authenticated channel untouched for the driver to own.

use tokio_util::sync::CancellationToken;

use crate::connector::Connector;
use crate::error::Result;
use crate::options::ConnectOptions;
use crate::stream::AuthenticatedChannel;

/// A reusable dial hook bound to one instance's connect options.
#[derive(Clone)]
pub struct Dialer {
    connector: Connector,
    options: ConnectOptions,
}

impl Dialer {
    /// Bind a connector to a set of options.
    pub fn new(connector: Connector, options: ConnectOptions) -> Self {
        Self { connector, options }
    }

    /// Open an authenticated channel, ignoring the driver-supplied address.
    ///
    /// The channel is handed off exactly as the connector produced it: no
    /// buffering, no read-ahead.
    pub async fn dial(&self, driver_host: &str, driver_port: u16) -> Result<AuthenticatedChannel> {
        self.check_driver_address(driver_host, driver_port);
        self.connector.connect(&self.options).await
    }

    /// Like [`dial`](Dialer::dial), aborting early when `cancel` fires.
    pub async fn dial_with_cancellation(
        &self,
        driver_host: &str,
        driver_port: u16,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedChannel> {
        self.check_driver_address(driver_host, driver_port);
        self.connector
            .connect_with_cancellation(&self.options, cancel)
            .await
    }

    /// The driver-supplied address is only a sanity check: the real
    /// endpoint comes from the control plane.
    fn check_driver_address(&self, driver_host: &str, driver_port: u16) {
        let instance = self.options.instance_uri().to_string();
        if driver_host != instance {
            warn!(
                "driver requested {}:{}; address is resolved from {}",
                driver_host, driver_port, instance
            );
        }
    }
}

/// One-shot convenience wrapper for drivers that dial rarely.
///
/// Builds a fresh [`Connector`] per call; reuse a [`Dialer`] when dialing
/// repeatedly.
pub async fn dial_for_driver(
    driver_host: &str,
    driver_port: u16,
    options: ConnectOptions,
) -> Result<AuthenticatedChannel> {
    let dialer = Dialer::new(Connector::new()?, options);
    dialer.dial(driver_host, driver_port).await
}
