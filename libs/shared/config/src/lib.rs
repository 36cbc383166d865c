use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Which appointment store backs the booking services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" | "in-memory" => Some(Self::Memory),
            "supabase" | "postgrest" => Some(Self::Supabase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub appointment_store: StoreBackend,
    pub doctor_directory_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            appointment_store: match env::var("APPOINTMENT_STORE") {
                Ok(raw) => StoreBackend::parse(&raw).unwrap_or_else(|| {
                    warn!("Unknown APPOINTMENT_STORE '{}', using in-memory store", raw);
                    StoreBackend::Memory
                }),
                Err(_) => StoreBackend::Memory,
            },
            doctor_directory_path: env::var("DOCTOR_DIRECTORY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|raw| {
                    raw.parse().map_err(|_| {
                        warn!("BIND_ADDR '{}' is not a socket address, using default", raw);
                    }).ok()
                })
                .unwrap_or_else(default_bind_addr),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Configuration with no remote store, for tests and local runs.
    pub fn local(jwt_secret: &str) -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: jwt_secret.to_string(),
            appointment_store: StoreBackend::Memory,
            doctor_directory_path: None,
            bind_addr: default_bind_addr(),
        }
    }

    pub fn is_configured(&self) -> bool {
        if self.supabase_jwt_secret.is_empty() {
            return false;
        }
        match self.appointment_store {
            StoreBackend::Memory => true,
            StoreBackend::Supabase => self.is_supabase_configured(),
        }
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)))
}
