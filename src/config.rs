use crate::common::Result;
use crate::driver::MaasDriver;

/// Prefix of the environment variables read by [`Config::from_env`], e.g.
/// `GRAVITON_MAAS__API_URL`.
pub const ENV_PREFIX: &str = "GRAVITON";

#[derive(Clone, serde::Deserialize)]
pub struct Config {
    pub maas: crate::maas::Config,
}

impl Config {
    pub fn into_driver(self) -> Result<MaasDriver> {
        MaasDriver::try_from(self.maas)
    }

    #[cfg(feature = "config")]
    pub fn from_env() -> Result<Self> {
        Self::from_environment(::config::Environment::with_prefix(ENV_PREFIX))
    }

    #[cfg(feature = "config")]
    fn from_environment(source: ::config::Environment) -> Result<Self> {
        ::config::Config::builder()
            .add_source(
                source
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|err| {
                crate::common::ConfigSnafu {
                    message: err.to_string(),
                    prefix: ENV_PREFIX,
                }
                .build()
            })
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> ::config::Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ::config::Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn reads_maas_section() {
        let config = Config::from_environment(environment(&[
            ("GRAVITON_MAAS__API_URL", "http://maas.local/MAAS/api/1.0"),
            ("GRAVITON_MAAS__API_KEY", "ckey:tkey:tsecret"),
            ("GRAVITON_MAAS__API_VERSION", "2"),
            ("GRAVITON_MAAS__TIMEOUT", "30"),
        ]))
        .unwrap();

        assert_eq!(config.maas.api_url.as_str(), "http://maas.local/MAAS/api/1.0");
        assert_eq!(config.maas.api_key, "ckey:tkey:tsecret");
        assert_eq!(config.maas.api_version, 2);
        assert_eq!(config.maas.timeout, Some(30));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let err = Config::from_environment(environment(&[(
            "GRAVITON_MAAS__API_KEY",
            "ckey:tkey:tsecret",
        )]))
        .err()
        .unwrap();

        assert!(err.to_string().starts_with("GRAVITON: "));
    }

    #[test]
    fn bad_credential_fails_driver_construction() {
        let config = Config::from_environment(environment(&[
            ("GRAVITON_MAAS__API_URL", "http://maas.local/MAAS/api/1.0"),
            ("GRAVITON_MAAS__API_KEY", "not-a-credential"),
        ]))
        .unwrap();

        assert!(matches!(
            config.into_driver(),
            Err(crate::common::Error::CredentialError { .. })
        ));
    }
}
