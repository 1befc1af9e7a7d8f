use std::net::SocketAddr;

use tokio::net::TcpListener;
use wordcall::config::Config;
use wordcall::startup::create_web_server;

#[tokio::main]
async fn main() {
    std_logger::Config::logfmt().init();

    let config = match Config::get() {
        Ok(config) => config,
        Err(error) => {
            log::error!("Unable to read the configuration. Error: '{error}'.");
            std::process::exit(1);
        }
    };

    let address = format!("{}:{}", config.application.host, config.application.port);
    let address: SocketAddr = match address.parse() {
        Ok(address) => address,
        Err(error) => {
            log::error!("Invalid listen address. Address: '{address}', Error: '{error}'.");
            std::process::exit(1);
        }
    };
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("Could not bind the listen address. Address: '{address}', Error: '{error}'.");
            std::process::exit(1);
        }
    };

    if let Err(error) = create_web_server(config, listener).await {
        log::error!("The web server stopped. Error: '{error}'.");
    }
}
