use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "crewcache";

/// OS-keychain storage for the operator's login credentials, keyed by the
/// sign-in email. Passwords never touch config files or the data store.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(email: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")
    }

    /// Remember the password for a sign-in email.
    pub fn store(email: &str, password: &str) -> Result<()> {
        Self::entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// Look up the stored password for a sign-in email.
    pub fn get_password(email: &str) -> Result<String> {
        Self::entry(email)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the stored password for a sign-in email.
    pub fn delete(email: &str) -> Result<()> {
        Self::entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }

    /// Whether a password is stored for this sign-in email.
    pub fn has_credentials(email: &str) -> bool {
        Self::entry(email)
            .map(|e| e.get_password().is_ok())
            .unwrap_or(false)
    }
}
