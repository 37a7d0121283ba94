use foodgram::{config::Config, make_router, run_app};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> foodgram::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load()?;
    let addr = config.address()?;
    let router = make_router();
    if let Err(error) = run_app(router, addr, config).await {
        tracing::error!("Error: {:#}", error);
        return Err(error);
    }
    Ok(())
}
