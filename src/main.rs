use concord::api;
use concord::logger::*;
use concord::server::*;
use concord::settings::*;
use std::fs;
use std::future::Future;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(
        backend = %project_settings.store.backend,
        address = %project_settings.http.address,
        "settings loaded"
    );
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;

    let server = Arc::new(Server::try_new(&project_settings).await?);
    let routes = api::filter(server.clone());

    match project_settings.http.tls_paths() {
        Some((cert_path, key_path)) => {
            for (what, path) in [("cert", cert_path), ("key", key_path)] {
                if !fs::metadata(path)?.is_file() {
                    return Err(anyhow::anyhow!(
                        "TLS {} is not a regular file: {:?}",
                        what,
                        path
                    ));
                }
            }
            info!(%address, "serving https");
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, shutdown_signal())
                .1
                .await;
        }
        None => {
            info!(%address, "serving http");
            let (_, serving) =
                warp::serve(routes).try_bind_with_graceful_shutdown(address, shutdown_signal())?;
            serving.await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(30);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}

fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    async {
        signal::ctrl_c().await.expect("Could not register SIGINT");
    }
}
