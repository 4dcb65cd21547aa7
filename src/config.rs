use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub pool_size: u32,
    pub session_ttl_days: i64,
}

impl Config {
    /// Reads settings from the environment. Call `dotenv::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "site.db".into());

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let port = parse_env("PORT").unwrap_or(5000);
        let pool_size = parse_env("DB_POOL_SIZE").filter(|n| *n > 0).unwrap_or(8);
        let session_ttl_days = parse_env("SESSION_TTL_DAYS").filter(|n| *n > 0).unwrap_or(1);

        Self {
            database_url,
            host,
            port,
            pool_size,
            session_ttl_days,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
