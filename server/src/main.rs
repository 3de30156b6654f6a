use std::time::Duration;

use log::{error, info};
use shared::{ROOM_CODE_LENGTH, TCP_PORT};

use clap::Parser;

use server::catbox::Catbox;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, default_value_t = TCP_PORT)]
    port: u16,

    /// Milliseconds between game ticks
    #[arg(short, long, default_value_t = 250)]
    tick_ms: u64,

    /// Minimum room code length; grows automatically if rooms run short
    #[arg(short, long, default_value_t = ROOM_CODE_LENGTH)]
    code_length: usize,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let tcp_addr = format!("{}:{}", args.host, args.port);

    let server = match Catbox::bind(
        tcp_addr.clone(),
        args.code_length,
        Duration::from_millis(args.tick_ms.max(1)),
    )
    .await
    {
        Ok(catbox_server) => catbox_server,
        Err(e) => {
            error!("Error binding: {}", e);
            return;
        }
    };

    info!("Catbox listening on TCP: {}", tcp_addr);

    match server.listen().await {
        Ok(_) => (),
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
}
