use crate::{
    auth::SessionStatus,
    models::User,
    AppState,
};

pub async fn sign_in(state: &AppState, username: &str, password: &str) -> Result<User, String> {
    let user = state
        .auth
        .sign_in(username, password)
        .await
        .map_err(|e| e.to_string())?;
    state.cache.clear().await;
    Ok(user)
}

pub async fn sign_up(
    state: &AppState,
    username: &str,
    password: &str,
    fullname: &str,
) -> Result<(), String> {
    state
        .auth
        .sign_up(username, password, fullname)
        .await
        .map_err(|e| e.to_string())
}

pub async fn restore_session(state: &AppState) -> Result<SessionStatus, String> {
    state.auth.restore_session().await.map_err(|e| e.to_string())
}

pub async fn sign_out(state: &AppState) -> Result<(), String> {
    state.auth.sign_out().await.map_err(|e| e.to_string())?;
    state.cache.clear().await;
    Ok(())
}

pub async fn current_user(state: &AppState) -> Option<User> {
    state.auth.current_user().await
}
