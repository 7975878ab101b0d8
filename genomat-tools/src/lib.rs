pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type AppResult<T> = Result<T, Box<dyn std::error::Error>>;
