pub mod configuration;
pub mod run;
pub mod xkcd;
pub mod xkcd_client;

pub use configuration::Settings;
pub use run::run;
pub use xkcd::Comic;
pub use xkcd_client::XkcdClient;
