// Apollo API key in the system keychain
//
// Optional third source for the API key, between the environment and the
// config file. Everything else lives in config.toml.

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "outreach";

/// Keychain account the Apollo key is stored under
const KEYCHAIN_ACCOUNT: &str = "apollo/api-key";

/// Read the API key from the system keychain.
/// Returns `None` when keychain support is off or no key is stored.
pub fn get_api_key() -> Option<String> {
    #[cfg(feature = "keychain")]
    {
        let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT).ok()?;
        match entry.get_password() {
            Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "no API key in keychain");
                None
            }
        }
    }
    #[cfg(not(feature = "keychain"))]
    {
        None
    }
}

/// Store the API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), String> {
    Err(format!(
        "Keychain support not enabled. Set {} or api_key in config.toml instead.",
        crate::settings::API_KEY_ENV
    ))
}

/// Delete the API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}
