use std::env;

/// Runtime settings resolved from the environment at startup.
///
/// `DATABASE_URL` is required; host and port fall back to a local default.
/// The JWT signing secret is read where it is used (see `auth::token`), but
/// `main` asserts its presence up front so the server fails fast.
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("SERVER_PORT must be a number"),
        }
    }

    /// Address tuple for `HttpServer::bind`.
    pub fn bind_addr(&self) -> (String, u16) {
        (self.server_host.clone(), self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_overrides() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.bind_addr(), ("127.0.0.1".to_string(), 8080));

        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("SERVER_PORT", "3000");

        let config = Config::from_env();
        assert_eq!(config.bind_addr(), ("0.0.0.0".to_string(), 3000));

        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
    }
}
