use crate::config::UserConfig;
use crate::error::{Error, ErrorKind};
use crate::writer::{Status, Writer};

const MIB: u64 = 1024 * 1024;

/// Where a function's archive goes, decided once per function
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    /// Archive is sent inline with the deploy call
    ///
    /// `requested` is set when the user asked for it with --without-cos.
    LocalPath { requested: bool },

    /// Bucket given on the command line
    ExplicitBucket(String),

    /// Bucket derived from the account, created on demand, falls back to `LocalPath`
    DefaultBucket(String),
}

impl Destination {
    /// Precedence: --without-cos, then --cos-bucket, then the stored preference
    ///
    /// Fails only when the default bucket is preferred but the account is not fully configured.
    pub(crate) fn resolve(
        without_cos: bool,
        cos_bucket: Option<&str>,
        config: &UserConfig,
    ) -> Result<Self, Error> {
        if without_cos {
            return Ok(Destination::LocalPath { requested: true });
        }

        if let Some(bucket) = cos_bucket.filter(|b| !b.is_empty()) {
            return Ok(Destination::ExplicitBucket(config.short_bucket_name(bucket)));
        }

        if config.using_cos {
            return Ok(Destination::DefaultBucket(config.default_bucket()?));
        }

        Ok(Destination::LocalPath { requested: false })
    }
}

/// Size thresholds of archives sent inline
#[derive(Debug, Clone, Copy)]
pub(crate) struct SizeLimits {
    /// Above this a COS upload is recommended
    pub(crate) notice: u64,

    /// At or above this the archive can not be sent inline at all
    pub(crate) ceiling: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        SizeLimits {
            notice: 8 * MIB,
            ceiling: 20 * MIB,
        }
    }
}

impl SizeLimits {
    pub(crate) fn check(&self, size: u64, writer: &Writer) -> Result<(), Error> {
        if size >= self.ceiling {
            writer.stage(
                "Warning",
                "Your package is too large and needs to be uploaded via COS.",
                Status::Warning,
            )?;

            return Err(Error::new(
                ErrorKind::Upload,
                "Upload failed",
                Some(
                    "Use --cos-bucket <BUCKET> to pick a bucket, \
                     or enable COS upload by default with `scf configure set --using-cos y`.",
                ),
            ));
        }

        if size >= self.notice {
            writer.stage(
                "Info",
                &format!(
                    "Package size is over {}M, uploading through COS is highly recommended.",
                    self.notice / MIB
                ),
                Status::Info,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(using_cos: bool) -> UserConfig {
        UserConfig {
            appid: "1250000000".into(),
            using_cos,
            ..Default::default()
        }
    }

    #[test]
    fn without_cos_wins_over_everything() {
        assert_eq!(
            Destination::resolve(true, Some("code"), &config(true)).unwrap(),
            Destination::LocalPath { requested: true }
        );
    }

    #[test]
    fn explicit_bucket_wins_over_the_preference() {
        assert_eq!(
            Destination::resolve(false, Some("code-1250000000"), &config(true)).unwrap(),
            Destination::ExplicitBucket("code".into())
        );
    }

    #[test]
    fn preference_selects_the_default_bucket() {
        assert_eq!(
            Destination::resolve(false, None, &config(true)).unwrap(),
            Destination::DefaultBucket("serverless-cloud-function-1250000000".into())
        );

        assert_eq!(
            Destination::resolve(false, None, &config(false)).unwrap(),
            Destination::LocalPath { requested: false }
        );
    }

    #[test]
    fn preference_without_appid_is_a_config_error() {
        let config = UserConfig {
            using_cos: true,
            ..Default::default()
        };

        let error = Destination::resolve(false, None, &config).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);

        // An explicit bucket does not need the default one
        assert!(Destination::resolve(false, Some("code"), &config).is_ok());
    }

    #[test]
    fn ceiling_is_inclusive() {
        let limits = SizeLimits::default();
        let writer = Writer::new(true);

        assert!(limits.check(20 * MIB - 1, &writer).is_ok());

        let error = limits.check(20 * MIB, &writer).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Upload);
    }
}
