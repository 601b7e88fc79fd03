use beliefcast_cli::{commands, get_config_info, setup_logger, Command};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    match &cli.command {
        Command::RegisterWeatherSensor(args) => {
            commands::register::run(&cli, args, &logger).await?
        }
        Command::GetWeatherForecasts(args) => {
            commands::forecasts::run(&cli, args, &logger).await?
        }
    }
    Ok(())
}
