mod cli_display;
mod client;
mod user_input;

use clap::Parser;
use rand::{Rng, rng, seq::IndexedRandom};

use crate::client::Client;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    name: Option<String>,

    /// Room to join; a new room is created when omitted
    #[arg(short, long)]
    code: Option<String>,

    #[arg(short, long, default_value = "127.0.0.1")]
    server_address: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let username = match args.name {
        Some(name) => name,
        None => generate_username(),
    };

    if let Err(e) = Client::run(&args.server_address, args.code.as_deref(), &username).await {
        eprintln!("{}", e);
    }
}

fn generate_username() -> String {
    let adjectives = ["fast", "lazy", "cool", "smart", "brave"];
    let nouns = ["tiger", "eagle", "lion", "panda", "wolf"];

    let mut rng = rng();

    let adjective = adjectives.choose(&mut rng).copied().unwrap_or("odd");
    let noun = nouns.choose(&mut rng).copied().unwrap_or("cat");
    let number: u16 = rng.random_range(1..999);

    format!("{}-{}{}", adjective, noun, number)
}
