use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::metrics::register_metrics;
use crate::routes;
use crate::session_factory::actor::SessionFactoryActor;

pub async fn create_web_server(config: Config, listener: TcpListener) -> std::io::Result<()> {
    register_metrics();
    let session_factory = Arc::new(SessionFactoryActor::spawn(
        config.session.clone(),
        config.vocabulary.clone(),
    ));

    let router = routes::create_router(&config).with_state(session_factory);

    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await
}
