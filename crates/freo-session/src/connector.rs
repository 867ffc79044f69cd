//! The hook the session manager uses to talk to a wallet.
//!
//! Freo doesn't implement a wallet, and it doesn't care how the page
//! reaches one (an injected EIP-1193 provider, WalletConnect, a test
//! double). It defines [`WalletConnector`]: the three calls auto-reconnect
//! needs. `freo-provider` implements it over an injected provider.

use std::future::Future;

use freo_protocol::{Address, ChainId};

use crate::ConnectorError;

/// A thin adapter over the user's wallet.
///
/// # Example
///
/// ```rust
/// use freo_protocol::{Address, ChainId};
/// use freo_session::{ConnectorError, WalletConnector};
///
/// /// A wallet that is always unlocked on one account.
/// struct FixedWallet(Address);
///
/// impl WalletConnector for FixedWallet {
///     async fn connect(&self) -> Result<(), ConnectorError> {
///         Ok(())
///     }
///
///     async fn get_address(&self) -> Result<Address, ConnectorError> {
///         Ok(self.0.clone())
///     }
///
///     async fn switch_network(&self, _chain_id: &ChainId) -> Result<(), ConnectorError> {
///         Err(ConnectorError::UserRejected)
///     }
/// }
/// ```
pub trait WalletConnector: Send + Sync + 'static {
    /// Asks the wallet for access to its accounts.
    ///
    /// # Returns
    /// - `Ok(())`: the page may read accounts
    /// - `Err(ConnectorError::NoProvider)`: no wallet in the page
    /// - `Err(ConnectorError::UserRejected)`: the user said no
    fn connect(&self) -> impl Future<Output = Result<(), ConnectorError>> + Send;

    /// Returns the currently selected account.
    fn get_address(&self) -> impl Future<Output = Result<Address, ConnectorError>> + Send;

    /// Asks the wallet to switch to `chain_id`.
    fn switch_network(
        &self,
        chain_id: &ChainId,
    ) -> impl Future<Output = Result<(), ConnectorError>> + Send;
}
