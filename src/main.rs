use epwgen::{EpwGenConfig, EpwGenerator, EpwRequest, OikolabClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: epwgen <latitude> <longitude> <year> <city> <state> <country> <output.epw>");
    std::process::exit(2);
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 7 {
        usage();
    }

    let (Ok(latitude), Ok(longitude), Ok(year)) = (
        args[0].parse::<f64>(),
        args[1].parse::<f64>(),
        args[2].parse::<i32>(),
    ) else {
        usage();
    };

    let config = match EpwGenConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let request = EpwRequest {
        latitude,
        longitude,
        year,
        city: args[3].clone(),
        state: args[4].clone(),
        country: args[5].clone(),
    };
    let output = PathBuf::from(&args[6]);

    let client = match OikolabClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    match EpwGenerator::new(client).generate(&request, &output) {
        Ok(epw) => {
            println!(
                "Wrote {} with {} hourly records",
                output.display(),
                epw.records.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
