use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Regions the platform is available in
pub(crate) const REGIONS: &[&str] = &[
    "ap-bangkok",
    "ap-beijing",
    "ap-chengdu",
    "ap-chongqing",
    "ap-guangzhou",
    "ap-hongkong",
    "ap-mumbai",
    "ap-nanjing",
    "ap-seoul",
    "ap-shanghai",
    "ap-shanghai-fsi",
    "ap-shenzhen-fsi",
    "ap-singapore",
    "ap-tokyo",
    "eu-frankfurt",
    "eu-moscow",
    "na-ashburn",
    "na-siliconvalley",
    "na-toronto",
];

pub(crate) const DEFAULT_REGION: &str = "ap-guangzhou";

/// Prefix of the bucket used when COS upload is enabled in the config
const DEFAULT_BUCKET_PREFIX: &str = "serverless-cloud-function";

/// Overrides the location of the config file
const CONFIG_PATH_ENV: &str = "SCF_CONFIG";

const SECRET_ID_ENV: &str = "TENCENTCLOUD_SECRET_ID";
const SECRET_KEY_ENV: &str = "TENCENTCLOUD_SECRET_KEY";
const SESSION_TOKEN_ENV: &str = "TENCENTCLOUD_SESSION_TOKEN";
const APPID_ENV: &str = "TENCENTCLOUD_APPID";
const REGION_ENV: &str = "TENCENTCLOUD_REGION";

fn default_region() -> String {
    DEFAULT_REGION.into()
}

/// Stored user preferences and account data
///
/// Loaded once per run and passed down explicitly to whoever needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserConfig {
    #[serde(skip)]
    pub(crate) path: PathBuf,

    #[serde(default)]
    pub(crate) secret_id: String,

    #[serde(default)]
    pub(crate) secret_key: String,

    /// Session token for temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) token: Option<String>,

    /// Account identifier, also the suffix of every COS bucket name
    #[serde(default)]
    pub(crate) appid: String,

    #[serde(default = "default_region")]
    pub(crate) region: String,

    /// Upload packages through the default COS bucket
    #[serde(default)]
    pub(crate) using_cos: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        UserConfig {
            path: PathBuf::new(),
            secret_id: String::new(),
            secret_key: String::new(),
            token: None,
            appid: String::new(),
            region: default_region(),
            using_cos: false,
        }
    }
}

impl UserConfig {
    /// Read the config file and apply environment overrides
    pub(crate) fn load() -> eyre::Result<Self> {
        Ok(Self::stored()?.with_env())
    }

    /// Only what is in the file, the one to update and save back
    pub(crate) fn stored() -> eyre::Result<Self> {
        Self::from_path(&Self::default_path()?)
    }

    /// Default location is ~/.scf/config.toml unless SCF_CONFIG is set
    pub(crate) fn default_path() -> eyre::Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = std::env::var("HOME").wrap_err("Can not read HOME env var")?;
        Ok(Path::new(&home).join(".scf").join("config.toml"))
    }

    /// Read config from the file, a missing file yields defaults
    pub(crate) fn from_path(path: &Path) -> eyre::Result<Self> {
        let toml_string = match fs::read_to_string(path) {
            Ok(text) => text,

            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                log::info!("No config at {path:?}, using defaults");

                return Ok(UserConfig {
                    path: path.to_path_buf(),
                    ..Default::default()
                });
            }

            Err(error) => {
                return Err(error).wrap_err(Error::new(
                    ErrorKind::Config,
                    &format!("Failed to read {path:?}"),
                    Some("Check the file permissions."),
                ));
            }
        };

        let mut config: UserConfig = toml::from_str(&toml_string).wrap_err(Error::new(
            ErrorKind::Config,
            &format!("Failed to parse {path:?}"),
            Some("Fix the file or remove it and run `scf configure set` again."),
        ))?;

        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Environment variables have higher priority than the file
    fn with_env(mut self) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(value) = read(SECRET_ID_ENV) {
            log::info!("Using secret id from env {SECRET_ID_ENV}");
            self.secret_id = value;
        }

        if let Some(value) = read(SECRET_KEY_ENV) {
            self.secret_key = value;
        }

        if let Some(value) = read(SESSION_TOKEN_ENV) {
            self.token = Some(value);
        }

        if let Some(value) = read(APPID_ENV) {
            self.appid = value;
        }

        if let Some(value) = read(REGION_ENV) {
            self.region = value;
        }

        self
    }

    pub(crate) fn save(&self) -> eyre::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .wrap_err(format!("Failed to create dir {dir:?} to store config"))?;
            }
        }

        fs::write(&self.path, toml::to_string_pretty(self)?).wrap_err(Error::new(
            ErrorKind::Config,
            "Failed to store config",
            Some(&format!("Check the file permissions of {:?}", self.path)),
        ))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(&self.secret_id, &self.secret_key, self.token.as_deref())
    }

    /// Region from the command line if given, otherwise the configured one
    pub(crate) fn region(&self, requested: Option<&str>) -> Result<String, Error> {
        let region = requested.unwrap_or(&self.region);
        validate_region(region)?;
        Ok(region.to_string())
    }

    /// Bucket names are stored without the "-{appid}" suffix
    pub(crate) fn short_bucket_name(&self, bucket: &str) -> String {
        if self.appid.is_empty() {
            return bucket.to_string();
        }

        bucket
            .strip_suffix(&format!("-{}", self.appid))
            .unwrap_or(bucket)
            .to_string()
    }

    /// Bucket packages go to when COS upload is enabled by default
    pub(crate) fn default_bucket(&self) -> Result<String, Error> {
        if self.appid.is_empty() {
            return Err(Error::new(
                ErrorKind::Config,
                "The default COS bucket needs the account appid",
                Some("Set it with `scf configure set --appid <APPID>`."),
            ));
        }

        Ok(format!("{DEFAULT_BUCKET_PREFIX}-{}", self.appid))
    }

    /// Update a single setting by its name in the file
    pub(crate) fn set(&mut self, key: &str, value: &str) -> eyre::Result<()> {
        match key {
            "secret_id" => self.secret_id = value.into(),
            "secret_key" => self.secret_key = value.into(),
            "token" => self.token = Some(value.to_string()).filter(|v| !v.is_empty()),
            "appid" => self.appid = value.into(),
            "region" => {
                validate_region(value)?;
                self.region = value.into();
            }
            "using_cos" => self.using_cos = parse_flag(value)?,
            _ => eyre::bail!("Unknown config key \"{key}\""),
        }

        Ok(())
    }
}

/// Accepts the spellings users commonly type for a boolean flag
fn parse_flag(value: &str) -> eyre::Result<bool> {
    match value.to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "on" => Ok(true),
        "n" | "no" | "false" | "0" | "off" => Ok(false),
        _ => Err(Error::new(
            ErrorKind::Args,
            &format!("Invalid boolean value \"{value}\""),
            Some("Use y or n."),
        )
        .into()),
    }
}

pub(crate) fn validate_region(region: &str) -> Result<(), Error> {
    if REGIONS.contains(&region) {
        return Ok(());
    }

    Err(Error::new(
        ErrorKind::Args,
        &format!("The region must be one of: {}.", REGIONS.join(", ")),
        None,
    ))
}
