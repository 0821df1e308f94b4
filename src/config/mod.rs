use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub struct Config {
    pub server: ServerConfig,
    pub rooms: RoomConfig,
    pub names: NameConfig,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

/// Room lifecycle settings, handed to the RoomManager at construction
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub max_participants: usize,
    pub idle_timeout: Duration,
    pub reap_interval: Duration,
}

/// Display-name validation bounds, enforced at the protocol boundary
#[derive(Debug, Clone)]
pub struct NameConfig {
    pub min_length: usize,
    pub max_length: usize,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("SERVER_PORT", 3000),
                cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            },
            rooms: RoomConfig {
                max_participants: env_parse("MAX_PARTICIPANTS_PER_ROOM", 25),
                idle_timeout: Duration::from_secs(env_parse("ROOM_IDLE_TIMEOUT_SECS", 600)),
                reap_interval: Duration::from_secs(env_parse("ROOM_REAP_INTERVAL_SECS", 60)),
            },
            names: NameConfig {
                min_length: env_parse("MIN_NAME_LENGTH", 1),
                max_length: env_parse("MAX_NAME_LENGTH", 50),
            },
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.parse_host_to_ipv4()), self.server.port)
    }

    fn parse_host_to_ipv4(&self) -> Ipv4Addr {
        // Try to parse as IP address first
        if let Ok(addr) = self.server.host.parse::<IpAddr>() {
            match addr {
                IpAddr::V4(ipv4) => return ipv4,
                IpAddr::V6(_) => {
                    tracing::warn!(
                        host = %self.server.host,
                        "IPv6 address provided but only IPv4 supported, using 0.0.0.0"
                    );
                    return Ipv4Addr::new(0, 0, 0, 0);
                }
            }
        }

        // Handle common hostnames
        match self.server.host.as_str() {
            "localhost" => Ipv4Addr::new(127, 0, 0, 1),
            "" | "0.0.0.0" => Ipv4Addr::new(0, 0, 0, 0),
            _ => {
                tracing::warn!(
                    host = %self.server.host,
                    "Unable to parse host as IPv4, using 0.0.0.0"
                );
                Ipv4Addr::new(0, 0, 0, 0)
            }
        }
    }
}
