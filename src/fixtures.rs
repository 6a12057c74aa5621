#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use crate::Configurable;

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct TestConfig {
        /// Set on the command line, otherwise left to the failure policy.
        #[configurator(flag = "name")]
        pub name: String,

        #[configurator(env = "AGE_ENV", default = "-1")]
        pub age: i16,
    }

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct FullConfig {
        #[configurator(flag = "name|anonymous|user name", env = "NAME", default = "nobody")]
        pub name: String,

        #[configurator(env = "PORT", default = "8080")]
        pub port: u16,

        #[configurator(env = "TIMEOUT", default = "1s")]
        pub timeout: Duration,

        #[configurator(default = "red;green ; blue")]
        pub colors: Vec<String>,

        #[configurator(env = "RATIO")]
        pub ratio: Option<f64>,

        #[configurator(nested)]
        pub database: DatabaseConfig,

        #[configurator(nested)]
        pub cache: Option<CacheConfig>,
    }

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct DatabaseConfig {
        #[configurator(env = "DB_URL", default = "postgres://localhost")]
        pub url: String,

        #[configurator(default = "5")]
        pub pool_size: usize,
    }

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct CacheConfig {
        #[configurator(default = "true")]
        pub enabled: bool,
    }

    // -- Fixtures for traversal tests --------------------------------------------

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct Leafy {
        #[configurator(default = "leaf")]
        pub name: String,

        #[configurator(env = "AGE")]
        pub age: u8,

        #[configurator(default = "a;b")]
        pub tags: Vec<String>,

        #[configurator(default = "7")]
        hidden: i32,

        #[configurator(skip)]
        pub ignored: String,
    }

    impl Leafy {
        pub fn hidden(&self) -> i32 {
            self.hidden
        }
    }

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct Root {
        #[configurator(default = "root")]
        pub title: String,

        #[configurator(nested)]
        pub branch: Branch,

        #[configurator(nested)]
        pub maybe: Option<Branch>,

        #[configurator(nested)]
        pub boxed: Option<Box<Branch>>,
    }

    #[derive(Configurable, Debug, Default, PartialEq)]
    pub struct Branch {
        #[configurator(env = "DEPTH", default = "1")]
        pub depth: u32,
    }

    #[test]
    fn fixtures_start_empty() {
        let config = FullConfig::default();
        assert!(config.name.is_empty());
        assert!(config.cache.is_none());
        assert_eq!(Leafy::default().hidden(), 0);
    }
}
