use std::{path::PathBuf, process::ExitCode, time::Duration};

use load_lifecycle::{prelude::*, utils::log_error};

/// Used when `LOAD_REFRESH_PERIOD_MS` is not set
const DEFAULT_PERIOD: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_micros()
        .init();

    log::info!("starting load-watch");
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: load-watch <file>");
        return ExitCode::FAILURE;
    };

    let config = match LoadConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", log_error(e));
            return ExitCode::FAILURE;
        }
    };
    let config = LoadConfig {
        period: config.period.or(Some(DEFAULT_PERIOD)),
        ..config
    };

    let controller = match LoadController::builder()
        .config(config)
        .fetch(move |_token| {
            let path = path.clone();
            async move {
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(FetchError::failed)
            }
        })
        .on_value_changed(|contents: &String| {
            log::info!("contents changed ({} bytes)", contents.len())
        })
        .build()
    {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{}", log_error(e));
            return ExitCode::FAILURE;
        }
    };

    let mut view = controller.subscribe_view();
    controller.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", *view.borrow_and_update());
            }
        }
    }

    controller.dispose().await;
    log::info!("load-watch stopped in state {}", controller.state());
    ExitCode::SUCCESS
}
