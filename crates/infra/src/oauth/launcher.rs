//! Opening the provider's sign-in page

use tracing::debug;
use userdesk_domain::ProviderError;

/// Shows a URL to the user in a separate window.
pub trait PopupLauncher: Send + Sync {
    /// Open `url` without waiting for the window to close.
    ///
    /// # Errors
    /// Returns `ProviderError::Failure` if no window could be opened.
    fn open(&self, url: &str) -> Result<(), ProviderError>;
}

/// Opens URLs in the user's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowserLauncher;

impl PopupLauncher for SystemBrowserLauncher {
    fn open(&self, url: &str) -> Result<(), ProviderError> {
        debug!("opening system browser");
        open::that_detached(url)
            .map_err(|err| ProviderError::Failure(format!("failed to open the browser: {err}")))
    }
}
