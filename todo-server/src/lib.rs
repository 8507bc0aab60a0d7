pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone, PartialEq)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Origin allowed to call the API from a browser. Any origin when unset.
        #[serde(default)]
        pub cors_allowed_origin: Option<String>,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_source(config::Environment::default())
        }

        fn from_source<S>(source: S) -> anyhow::Result<Self>
        where
            S: config::Source + Send + Sync + 'static,
        {
            let settings = config::Config::builder().add_source(source).build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

}

pub mod entities;
pub mod todo;
pub mod web;
