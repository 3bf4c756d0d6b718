use config::{Config, ConfigError};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub resource_name: String,
    pub worker_count: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl Settings {
    pub fn new(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api_base", "https://xkcd.com/")?
            .set_default("resource_name", "info.0.json")?
            .set_default("worker_count", 4_i64)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("max_retries", 3_i64)?;
        if let Some(file) = config_file {
            builder = builder.add_source(config::File::with_name(file));
        }
        builder.build()?.try_deserialize()
    }

    /// URL of the metadata document for the most recently published comic.
    pub fn latest_url(&self) -> String {
        format!("{}{}", self.api_base, self.resource_name)
    }

    /// URL of the metadata document for one numbered comic.
    pub fn comic_url(&self, id: u32) -> String {
        format!("{}{}/{}", self.api_base, id, self.resource_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = Settings::new(None).unwrap();

        assert_eq!("https://xkcd.com/", c.api_base);
        assert_eq!("info.0.json", c.resource_name);
        assert_eq!(4, c.worker_count);
        assert_eq!(30, c.request_timeout_secs);
        assert_eq!(3, c.max_retries);
    }

    #[test]
    fn load_config() {
        let c = Settings::new(Some("xkcd.test.json")).unwrap();

        assert_eq!("http://localhost:8080/", c.api_base);
        assert_eq!(2, c.worker_count);
        // Untouched keys keep their defaults
        assert_eq!("info.0.json", c.resource_name);
        assert_eq!(3, c.max_retries);
    }

    #[test]
    fn url_templates() {
        let c = Settings::new(None).unwrap();

        assert_eq!("https://xkcd.com/info.0.json", c.latest_url());
        assert_eq!("https://xkcd.com/614/info.0.json", c.comic_url(614));
    }
}
