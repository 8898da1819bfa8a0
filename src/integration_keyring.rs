//! Keyring helpers for remote service credentials.

use keyring::Entry;

const SERVICE_NAME: &str = "playlist-cache.opensubsonic";

fn account_key(endpoint: &str, username: &str) -> String {
    format!("{}@{}", username.trim(), endpoint.trim().trim_end_matches('/'))
}

fn service_entry(endpoint: &str, username: &str) -> Result<Entry, String> {
    Entry::new(SERVICE_NAME, &account_key(endpoint, username))
        .map_err(|err| format!("failed to create keyring entry: {err}"))
}

/// Saves the service password for an account into the OS keyring.
pub fn set_service_password(endpoint: &str, username: &str, password: &str) -> Result<(), String> {
    let entry = service_entry(endpoint, username)?;
    entry
        .set_password(password)
        .map_err(|err| format!("failed to set keyring password: {err}"))
}

/// Loads the service password for an account from the OS keyring.
pub fn get_service_password(endpoint: &str, username: &str) -> Result<Option<String>, String> {
    let entry = service_entry(endpoint, username)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(format!("failed to get keyring password: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::account_key;

    #[test]
    fn test_account_key_ignores_trailing_slash_and_whitespace() {
        assert_eq!(
            account_key("https://music.example.com/ ", " alice"),
            "alice@https://music.example.com"
        );
    }
}
