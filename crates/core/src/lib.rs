pub mod auth;
pub mod decode;
pub mod invest;
pub mod money;
pub mod report;

pub mod config {
    pub const DEFAULT_BASE_URL: &str = "https://invest-public-api.tinkoff.ru/rest";

    const DEFAULT_TOKEN_PATH: &str = "token.txt";
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub token_path: String,
        pub base_url: String,
        pub timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> Self {
            let token_path = std::env::var("INVEST_TOKEN_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string());

            let base_url = std::env::var("INVEST_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

            let timeout_secs = std::env::var("INVEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS);

            Self {
                token_path,
                base_url,
                timeout_secs,
            }
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                token_path: DEFAULT_TOKEN_PATH.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            }
        }
    }
}
