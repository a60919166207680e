/// Walks one identity through issue, rotate and replay against the store
/// backend named in the settings file.
///
/// ```text
/// $ cargo run --bin lifecycle_demo -- --settings=settings/dev.toml
/// ```
///
/// With `store.backend = "redis"` or `"mysql"` the matching service must be
/// reachable; for MySQL apply `sql/schema.sql` first.
use jwt_pair::application_port::TokenError;
use jwt_pair::domain_model::Identity;
use jwt_pair::logger::*;
use jwt_pair::server::Server;
use jwt_pair::settings::*;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();

    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let server = Server::try_new(&project_settings).await?;
    let service = server.token_service.clone();
    let cancel = CancellationToken::new();

    let identity = Identity::from("6ba7b810-9dad-11d1-80b4-00c04fd430c8");

    let first = service.issue(&identity, &cancel).await?;
    info!(access = %first.access_token.0, refresh = %first.refresh_token.0, "issued");

    let grant = service.verify_access(&first.access_token.0).await?;
    info!(identity = %grant.identity, expires_at = %grant.expires_at, "access token verified");

    let second = service.rotate(&first.refresh_token.0, &cancel).await?;
    info!(refresh = %second.refresh_token.0, "rotated");

    match service.rotate(&first.refresh_token.0, &cancel).await {
        Err(TokenError::PermissionDenied) => info!("replay of the first refresh token refused"),
        other => warn!(?other, "unexpected replay outcome"),
    }

    let third = service
        .rotate_bound(&second.access_token.0, &second.refresh_token.0, &cancel)
        .await?;
    info!(refresh = %third.refresh_token.0, "rotated with bound access token");

    server.shutdown().await;
    Ok(())
}
