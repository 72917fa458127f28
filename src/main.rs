use anyhow::{bail, Result};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voxstream::audio::PlaybackWorker;
use voxstream::config::ApiConfig;
use voxstream::controller::Controller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voxstream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let secure = if let Some(pos) = args.iter().position(|a| a == "--secure") {
        args.remove(pos);
        true
    } else {
        false
    };

    if args.len() < 2 {
        bail!("Usage: voxstream [--secure] <host[:port]> <question...>");
    }
    let host = args.remove(0);
    let question = args.join(" ");

    let config = ApiConfig::new(&host, secure);
    info!("Asking {} via {}", host, config.base_url());

    #[cfg(feature = "audio-io")]
    let playback = PlaybackWorker::spawn(voxstream::audio::RodioSink::new);

    #[cfg(not(feature = "audio-io"))]
    let playback = PlaybackWorker::spawn(|| Ok(voxstream::audio::NullSink));

    let mut controller = Controller::new(config, playback);

    controller.ask(&question).await?;
    println!("{}", controller.status());

    controller.pump_until_idle().await;
    println!("{}", controller.status());

    // Chunks queued before the stream ended keep playing to completion;
    // late events (the trailing close frame) are still applied meanwhile
    while !controller.playback().is_idle() {
        controller.poll_events();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    controller.poll_events();

    controller.shutdown();
    Ok(())
}
