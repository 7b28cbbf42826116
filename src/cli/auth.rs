use crate::{
    Res,
    config::ServiceConfig,
    info,
    management::{TokenManager, credential_path},
    service::auth as oauth,
    success, warning,
};

/// Opens a session for the credential `name`.
///
/// A stored credential is reused. Otherwise the browser login runs and the
/// obtained token is written to the credential file only when `save` is set.
pub async fn login(config: &ServiceConfig, name: &str, save: bool) -> Res<TokenManager> {
    match TokenManager::load(name).await {
        Ok(manager) => {
            if let Some(path) = manager.path() {
                tracing::debug!("using stored credential {}", path.display());
            }
            return Ok(manager);
        }
        Err(e) => tracing::debug!("no usable stored credential: {}", e),
    }

    info!("No stored credential '{}', starting browser login", name);
    let token = oauth::authorize(config).await?;
    let manager = TokenManager::new(token);

    if !save {
        return Ok(manager);
    }

    let manager = manager.with_path(credential_path(name));
    manager.persist().await?;
    success!("Credential '{}' saved", name);
    Ok(manager)
}

/// Runs the browser login and stores the session as `name`, replacing any
/// existing credential of that name.
pub async fn auth(config: &ServiceConfig, name: &str) -> Res<()> {
    let token = oauth::authorize(config).await?;
    let manager = TokenManager::new(token).with_path(credential_path(name));
    manager.persist().await?;
    success!("Authentication successful!");
    Ok(())
}

/// Forgets the stored credential `name`.
pub async fn logout(name: &str) -> Res<()> {
    let path = credential_path(name);
    match async_fs::remove_file(&path).await {
        Ok(()) => success!("Removed credential '{}'", name),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warning!("No credential named '{}'", name)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
