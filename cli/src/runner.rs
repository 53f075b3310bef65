use crate::api::cos::CosClient;
use crate::api::scf::ScfClient;
use crate::config::UserConfig;
use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind};
use crate::writer::Writer;
use std::error::Error as StdError;

pub(crate) trait Runner {
    /// Run the command
    ///
    /// Returns an error shown to the user in case of failure
    async fn run(&mut self) -> Result<(), Error>;

    /// Stored configuration with environment overrides applied
    fn user_config(&self) -> Result<UserConfig, Error> {
        UserConfig::load().map_err(|e| {
            // Keep the user-facing error if the config layer produced one
            match e.downcast::<Error>() {
                Ok(error) => error,
                Err(e) => self.error(
                    ErrorKind::Config,
                    Some("Failed to load the configuration"),
                    Some("Set SCF_CONFIG or HOME to point to the config location."),
                    Some(e.into()),
                ),
            }
        })
    }

    /// Credentials from the config, which must hold a complete key pair
    fn credentials(&self, config: &UserConfig) -> Result<Credentials, Error> {
        let credentials = config.credentials();

        if !credentials.is_valid() {
            return Err(self.error(
                ErrorKind::Config,
                Some("Credentials are not configured"),
                Some(
                    "Run `scf configure set --secret-id <ID> --secret-key <KEY>` \
                     or set TENCENTCLOUD_SECRET_ID and TENCENTCLOUD_SECRET_KEY.",
                ),
                None,
            ));
        }

        Ok(credentials)
    }

    /// Client of the function platform API in the given region
    fn scf_client(&self, config: &UserConfig, region: &str) -> Result<ScfClient, Error> {
        Ok(ScfClient::new(self.credentials(config)?, region))
    }

    /// Client of the object storage in the given region
    fn cos_client(&self, config: &UserConfig, region: &str) -> Result<CosClient, Error> {
        Ok(CosClient::new(
            self.credentials(config)?,
            &config.appid,
            region,
        ))
    }

    /// Construct an error shown to the user
    fn error(
        &self,
        kind: ErrorKind,
        title: Option<&str>,
        description: Option<&str>,
        origin: Option<Box<dyn StdError>>,
    ) -> Error {
        if let Some(origin) = origin {
            log::error!("{origin:?}");
        }

        if let Some(title) = title {
            Error::new(kind, title, description)
        } else {
            Error::new(
                kind,
                "Failed to run the command",
                Some("Run again with SCF_LOG=debug to see what happened."),
            )
        }
    }
}

/// Return a runner for a command
///
/// Ideally this should be a macro
pub(crate) trait Runnable {
    fn runner(&self, writer: &Writer) -> impl Runner;
}
