use clap::Parser;
use rand::RngCore;
use std::path::PathBuf;

/// Server arguments; every knob is also an environment variable so the
/// binary can run flagless under a process supervisor.
#[derive(Parser, Debug)]
#[command(name = "pointer-liveness-gate")]
pub struct Args {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Standalone challenge TTL; embed challenges live twice as long.
    #[arg(long, env = "CHALLENGE_TTL_MS", default_value_t = 180_000)]
    pub challenge_ttl_ms: u64,

    /// HMAC key for tokens, receipts, and IP hashing. When unset an
    /// ephemeral key is generated and receipts do not survive restarts.
    #[arg(long, env = "CLNP_SECRET")]
    pub secret: Option<String>,

    /// Bearer token for the admin read paths. Unset disables them (503).
    #[arg(long, env = "CLNP_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    #[arg(long, env = "CLNP_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

/// Immutable process configuration, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub challenge_ttl_ms: u64,
    pub secret: Vec<u8>,
    pub secret_is_ephemeral: bool,
    pub admin_token: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let (secret, secret_is_ephemeral) = match args.secret {
            Some(s) if !s.is_empty() => (s.into_bytes(), false),
            _ => {
                let mut key = vec![0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut key);
                (key, true)
            }
        };
        Self {
            host: args.host,
            port: args.port,
            challenge_ttl_ms: args.challenge_ttl_ms,
            secret,
            secret_is_ephemeral,
            admin_token: args.admin_token,
            data_dir: args.data_dir,
        }
    }

    pub fn embed_ttl_ms(&self) -> u64 {
        self.challenge_ttl_ms * 2
    }

    pub fn session_log_path(&self) -> PathBuf {
        self.data_dir.join("sessions.jsonl")
    }

    /// A config with a fixed secret, for tests and embedding.
    pub fn for_tests(secret: &[u8]) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            challenge_ttl_ms: 180_000,
            secret: secret.to_vec(),
            secret_is_ephemeral: false,
            admin_token: None,
            data_dir: PathBuf::from("."),
        }
    }
}
