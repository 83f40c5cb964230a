#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};

    use crate::record::{Fields, Record};

    #[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub database: TestDbConfig,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                database: TestDbConfig::default(),
            }
        }
    }

    impl Record for TestConfig {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new()
                .leaf("host", &mut self.host)
                .tag("desc", "The application host.")
                .leaf("port", &mut self.port)
                .tag("desc", "The port number.")
                .leaf("debug", &mut self.debug)
                .nested("database", &mut self.database)
        }
    }

    #[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestDbConfig {
        pub url: Option<String>,
        pub pool_size: usize,
    }

    impl Default for TestDbConfig {
        fn default() -> Self {
            Self {
                url: None,
                pool_size: 5,
            }
        }
    }

    impl Record for TestDbConfig {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new()
                .optional("url", &mut self.url)
                .leaf("pool_size", &mut self.pool_size)
        }
    }

    /// Single integer field, checked by its validator to equal 33.
    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Counter {
        pub i: i64,
    }

    impl Record for Counter {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new().leaf("i", &mut self.i).tag("desc", "counter value")
        }
    }

    /// `A { B { X } }` shape. `x` carries `~foo` under the `alt` tag key.
    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Outer {
        pub b: Inner,
    }

    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Inner {
        pub x: i32,
    }

    impl Record for Outer {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new().nested("b", &mut self.b)
        }
    }

    impl Record for Inner {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new().leaf("x", &mut self.x).tag("alt", "~foo")
        }
    }

    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Wrapper {
        pub common: Common,
        pub name: String,
    }

    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Common {
        pub verbose: bool,
    }

    impl Record for Wrapper {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new()
                .embedded("common", &mut self.common)
                .leaf("name", &mut self.name)
        }
    }

    impl Record for Common {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new().leaf("verbose", &mut self.verbose)
        }
    }

    #[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
    pub struct Empty {}

    impl Record for Empty {
        fn fields(&mut self) -> Fields<'_> {
            Fields::new()
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = TestConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }
}
