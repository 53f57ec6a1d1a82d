//! Account commands: register, login, logout, whoami.

use secrecy::SecretString;
use tracing::info;

use qkart_storefront::Result;
use qkart_storefront::notify::{Notification, Notifier};
use qkart_storefront::services::auth::{LOGIN_SUCCESS, REGISTER_SUCCESS};
use qkart_storefront::state::AppState;

/// Create an account.
///
/// # Errors
///
/// Returns an error if the form is invalid or the backend refuses it.
pub async fn register(
    state: &AppState,
    notifier: &dyn Notifier,
    username: &str,
    password: String,
    confirm: String,
) -> Result<()> {
    state
        .auth()
        .register(
            username,
            SecretString::from(password),
            &SecretString::from(confirm),
        )
        .await?;
    notifier.notify(Notification::success(REGISTER_SUCCESS));
    Ok(())
}

/// Log in and save the session.
///
/// # Errors
///
/// Returns an error if the credentials are invalid or rejected, or the
/// session cannot be saved.
pub async fn login(
    state: &AppState,
    notifier: &dyn Notifier,
    username: &str,
    password: String,
) -> Result<()> {
    let mut session = state.session()?;
    let current = state
        .auth()
        .login(&mut session, username, SecretString::from(password))
        .await?;
    info!("Wallet balance: {}", current.balance);
    notifier.notify(Notification::success(LOGIN_SUCCESS));
    Ok(())
}

/// Clear the saved session.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub fn logout(state: &AppState) -> Result<()> {
    let mut session = state.session()?;
    state.auth().logout(&mut session)
}

/// Show the logged-in user.
///
/// # Errors
///
/// Returns an error if the session file cannot be read.
pub fn whoami(state: &AppState) -> Result<()> {
    match state.session()?.session() {
        Some(current) => info!(
            "Logged in as {} (wallet balance {})",
            current.username, current.balance
        ),
        None => info!("Not logged in"),
    }
    Ok(())
}
