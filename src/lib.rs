pub mod agent;
pub mod cli;
pub mod errors;
pub mod freshness;
pub mod llm;
pub mod models;
pub mod search;
pub mod server;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Default Chat Model: {}", args.chat_model);
    info!("Search Base URL: {}", args.search_base_url);
    info!("Search Engine: {}", args.search_engine);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::from_args(&args)?);
    let server = Server::new(args.server_addr.clone(), agent);
    server.run().await?;

    Ok(())
}
