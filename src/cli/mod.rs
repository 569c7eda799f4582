use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Completion provider args ---
    /// API key for the chat completion provider.
    #[arg(long, env = "OPENAI_API_KEY")]
    pub chat_api_key: String,

    /// Base URL for the chat completion API.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.openai.com")]
    pub chat_base_url: String,

    /// Default model used when a request names no model, or an unrecognized one.
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-3.5-turbo")]
    pub chat_model: String,

    // --- Search provider args ---
    /// API key for the web-search provider.
    #[arg(long, env = "SERP_API_KEY")]
    pub search_api_key: String,

    /// Base URL for the web-search API.
    #[arg(long, env = "SEARCH_BASE_URL", default_value = "https://serpapi.com")]
    pub search_base_url: String,

    /// Search engine parameter passed to the provider.
    #[arg(long, env = "SEARCH_ENGINE", default_value = "google")]
    pub search_engine: String,
}
