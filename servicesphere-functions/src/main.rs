use servicesphere_functions::{FunctionConfig, NotifierRuntime, init_tracing_with_level};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FunctionConfig::load()?;
    init_tracing_with_level(&config.log_level);

    let runtime = match NotifierRuntime::from_config(config).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start notifier");
            return Err(e.into());
        }
    };

    runtime.run().await?;
    Ok(())
}
