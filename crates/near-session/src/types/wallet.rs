//! Wallet session state, login URL construction and callback parsing.

use std::str::FromStr;

use url::Url;

/// Default browser wallet login page.
pub const DEFAULT_WALLET_LOGIN_URL: &str = "https://wallet.testnet.near.org/login/";

/// Default deep link the wallet redirects to on success.
pub const DEFAULT_SUCCESS_URL: &str = "myapp://callback";

/// Default deep link the wallet redirects to on failure.
pub const DEFAULT_FAILURE_URL: &str = "myapp://callback?error=true";

/// Default contract the login requests access for.
pub const DEFAULT_CONTRACT_ID: &str = "example-contract.testnet";

/// Connection state of the wallet.
///
/// Created disconnected. Disconnecting always returns to
/// [`WalletState::default()`], never a partially cleared state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletState {
    pub is_connected: bool,
    pub account_id: Option<String>,
    /// Formatted balance of the connected account, once known.
    pub balance: Option<String>,
}

impl WalletState {
    /// A freshly connected wallet with no known balance.
    pub fn connected(account_id: impl Into<String>) -> Self {
        Self {
            is_connected: true,
            account_id: Some(account_id.into()),
            balance: None,
        }
    }

    /// Returns true if connected as `account_id`.
    pub fn is_connected_as(&self, account_id: &str) -> bool {
        self.is_connected && self.account_id.as_deref() == Some(account_id)
    }
}

// ============================================================================
// Login URL
// ============================================================================

/// Configuration for the browser wallet login flow.
///
/// # Example
///
/// ```rust
/// use near_session::WalletLogin;
///
/// let url = WalletLogin::default().login_url("x.testnet");
/// let pairs: Vec<_> = url.query_pairs().into_owned().collect();
/// assert!(pairs.contains(&("contract_id".into(), "x.testnet".into())));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletLogin {
    base_url: Url,
    success_url: String,
    failure_url: String,
    contract_id: String,
}

impl Default for WalletLogin {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_WALLET_LOGIN_URL)
                .expect("default wallet login URL should be valid"),
            success_url: DEFAULT_SUCCESS_URL.to_string(),
            failure_url: DEFAULT_FAILURE_URL.to_string(),
            contract_id: DEFAULT_CONTRACT_ID.to_string(),
        }
    }
}

impl WalletLogin {
    /// Use a custom wallet login page.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::default()
        })
    }

    /// Set the deep link used on successful login.
    pub fn success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = url.into();
        self
    }

    /// Set the deep link used on failed login.
    pub fn failure_url(mut self, url: impl Into<String>) -> Self {
        self.failure_url = url.into();
        self
    }

    /// Set the contract used by [`default_login_url`](Self::default_login_url).
    pub fn contract_id(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = contract_id.into();
        self
    }

    /// The wallet login page.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the login URL for `contract_id`.
    ///
    /// Adds exactly `success_url`, `failure_url` and `contract_id`.
    pub fn login_url(&self, contract_id: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("success_url", &self.success_url)
            .append_pair("failure_url", &self.failure_url)
            .append_pair("contract_id", contract_id);
        url
    }

    /// Build the login URL for the configured contract.
    pub fn default_login_url(&self) -> Url {
        self.login_url(&self.contract_id)
    }
}

// ============================================================================
// Callback
// ============================================================================

/// Query parameters delivered by the wallet's redirect back into the app.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletCallback {
    pub account_id: Option<String>,
    pub error: Option<String>,
    pub public_key: Option<String>,
    pub all_keys: Option<String>,
}

/// What a callback means for the wallet session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Login succeeded for this account.
    Connect(String),
    /// The wallet reported an error; the session is left unchanged.
    Failed(String),
    /// Neither an account nor an error was present.
    Ignored,
}

impl WalletCallback {
    /// A callback carrying only an account id.
    pub fn success(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    /// A callback carrying only an error.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Extract the wallet parameters from a deep-link URI.
    pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(uri)?;
        let mut callback = Self::default();
        for (key, value) in url.query_pairs() {
            let slot = match &*key {
                "account_id" => &mut callback.account_id,
                "error" => &mut callback.error,
                "public_key" => &mut callback.public_key,
                "all_keys" => &mut callback.all_keys,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        Ok(callback)
    }

    /// Decide connect vs. no-op. An error takes precedence over an account.
    pub fn outcome(&self) -> CallbackOutcome {
        match (&self.error, &self.account_id) {
            (Some(error), _) => CallbackOutcome::Failed(error.clone()),
            (None, Some(account_id)) => CallbackOutcome::Connect(account_id.clone()),
            (None, None) => CallbackOutcome::Ignored,
        }
    }
}

impl FromStr for WalletCallback {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    // ========================================================================
    // WalletState tests
    // ========================================================================

    #[test]
    fn test_wallet_state_default_is_disconnected() {
        let state = WalletState::default();
        assert!(!state.is_connected);
        assert_eq!(state.account_id, None);
        assert_eq!(state.balance, None);
    }

    #[test]
    fn test_wallet_state_connected() {
        let state = WalletState::connected("alice.testnet");
        assert!(state.is_connected);
        assert_eq!(state.account_id.as_deref(), Some("alice.testnet"));
        assert!(state.is_connected_as("alice.testnet"));
        assert!(!state.is_connected_as("bob.testnet"));
    }

    // ========================================================================
    // WalletLogin tests
    // ========================================================================

    #[test]
    fn test_login_url_defaults() {
        let url = WalletLogin::default().login_url("x.testnet");
        assert!(url.as_str().starts_with(DEFAULT_WALLET_LOGIN_URL));

        let params = query(&url);
        assert_eq!(params.len(), 3);
        assert_eq!(params["success_url"], "myapp://callback");
        assert_eq!(params["failure_url"], "myapp://callback?error=true");
        assert_eq!(params["contract_id"], "x.testnet");
    }

    #[test]
    fn test_login_url_custom() {
        let login = WalletLogin::new("https://wallet.example.com/login")
            .unwrap()
            .success_url("demo://ok")
            .failure_url("demo://fail")
            .contract_id("guestbook.testnet");

        let url = login.default_login_url();
        assert_eq!(url.host_str(), Some("wallet.example.com"));

        let params = query(&url);
        assert_eq!(params["success_url"], "demo://ok");
        assert_eq!(params["failure_url"], "demo://fail");
        assert_eq!(params["contract_id"], "guestbook.testnet");
    }

    #[test]
    fn test_login_url_invalid_base() {
        assert!(WalletLogin::new("not a url").is_err());
    }

    // ========================================================================
    // WalletCallback tests
    // ========================================================================

    #[test]
    fn test_parse_success_callback() {
        let callback: WalletCallback =
            "myapp://callback?account_id=alice.testnet&public_key=ed25519%3Aabc&all_keys=ed25519%3Aabc"
                .parse()
                .unwrap();
        assert_eq!(callback.account_id.as_deref(), Some("alice.testnet"));
        assert_eq!(callback.public_key.as_deref(), Some("ed25519:abc"));
        assert_eq!(callback.all_keys.as_deref(), Some("ed25519:abc"));
        assert_eq!(
            callback.outcome(),
            CallbackOutcome::Connect("alice.testnet".to_string())
        );
    }

    #[test]
    fn test_error_takes_precedence() {
        let callback =
            WalletCallback::parse("myapp://callback?account_id=alice.testnet&error=true").unwrap();
        assert_eq!(callback.outcome(), CallbackOutcome::Failed("true".to_string()));
    }

    #[test]
    fn test_empty_callback_is_ignored() {
        let callback = WalletCallback::parse("myapp://callback").unwrap();
        assert_eq!(callback, WalletCallback::default());
        assert_eq!(callback.outcome(), CallbackOutcome::Ignored);
    }
}
