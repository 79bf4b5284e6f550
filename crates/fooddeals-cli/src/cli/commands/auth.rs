//! Session and account command handlers.

use anyhow::{Context, Result};
use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::config::paths;

pub async fn register(api: &FoodDealsApi, email: &str, password: &str) -> Result<()> {
    let response = api.register(email, password).await.context("register")?;
    if let Some(status) = response.status.as_deref() {
        println!("{status}");
    }
    if api.tokens().is_signed_in() {
        println!("Signed in as {}", email.trim());
    }
    Ok(())
}

pub async fn login(api: &FoodDealsApi, email: &str, password: &str) -> Result<()> {
    let response = api.login(email, password).await.context("login")?;
    if response.access_token.is_none() {
        anyhow::bail!("Login succeeded but no access token was returned");
    }
    println!("Signed in as {}", email.trim());
    Ok(())
}

pub fn logout(api: &FoodDealsApi) -> Result<()> {
    let was_signed_in = api.tokens().is_signed_in();
    api.logout().context("logout")?;
    if was_signed_in {
        println!("Signed out. Removed session at {}", paths::session_path().display());
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub async fn whoami(api: &FoodDealsApi) -> Result<()> {
    let profile = api.fetch_profile().await.context("fetch profile")?;
    match profile.id {
        Some(id) => println!("{} (id {id})", profile.email),
        None => println!("{}", profile.email),
    }
    if profile.confirmed == Some(false) {
        println!("Email not confirmed yet.");
    }
    Ok(())
}

pub async fn refresh(api: &FoodDealsApi) -> Result<()> {
    if api.client().refresh_session().await.is_some() {
        println!("Session refreshed.");
        Ok(())
    } else {
        anyhow::bail!("Session expired. Please log in again.")
    }
}

pub async fn forgot_password(api: &FoodDealsApi, email: &str) -> Result<()> {
    let status = api
        .request_password_reset(email)
        .await
        .context("request password reset")?;
    println!("{}", status.message());
    Ok(())
}

pub async fn reset_password(api: &FoodDealsApi, token: &str, new_password: &str) -> Result<()> {
    let status = api
        .reset_password(token, new_password)
        .await
        .context("reset password")?;
    println!("{}", status.message());
    Ok(())
}

pub async fn delete_account(api: &FoodDealsApi) -> Result<()> {
    let status = api.delete_account().await.context("delete account")?;
    println!("{}", status.message());
    Ok(())
}
