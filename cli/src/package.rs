pub(crate) mod archive;
pub(crate) mod destination;

use crate::api::cos::ObjectStorage;
use crate::api::ApiError;
use crate::config::UserConfig;
use crate::error::{Error, ErrorKind};
use crate::progress::Progress;
use crate::template::function::CodeSource;
use crate::template::{Resources, Template};
use crate::writer::{Status, Writer};
use archive::Archive;
use destination::{Destination, SizeLimits};
use std::path::{Path, PathBuf};

/// Archives are kept here, relative to the working directory
pub(crate) const BUILD_DIR: &str = ".scf_build";

/// What to package and where to put it
#[derive(Debug, Clone)]
pub(crate) struct PackageOptions {
    /// Package only the function with this name
    pub(crate) function: Option<String>,

    /// Deploy every function into this namespace instead of the template's one
    pub(crate) namespace: Option<String>,

    pub(crate) cos_bucket: Option<String>,
    pub(crate) without_cos: bool,
    pub(crate) build_dir: PathBuf,
    pub(crate) limits: SizeLimits,
}

impl Default for PackageOptions {
    fn default() -> Self {
        PackageOptions {
            function: None,
            namespace: None,
            cos_bucket: None,
            without_cos: false,
            build_dir: PathBuf::from(BUILD_DIR),
            limits: SizeLimits::default(),
        }
    }
}

/// Zips functions' code and uploads it where `Destination` says
pub(crate) struct Packager<'a> {
    storage: &'a dyn ObjectStorage,
    config: &'a UserConfig,
    writer: &'a Writer,
    options: PackageOptions,
}

impl<'a> Packager<'a> {
    pub(crate) fn new(
        storage: &'a dyn ObjectStorage,
        config: &'a UserConfig,
        writer: &'a Writer,
        options: PackageOptions,
    ) -> Self {
        Packager {
            storage,
            config,
            writer,
            options,
        }
    }

    /// Package every selected function, one after another
    ///
    /// Functions not matching the name filter are dropped from the returned resources,
    /// the remaining ones get their `code` set.
    pub(crate) async fn package(&self, template: Template) -> Result<Resources, Error> {
        let base_dir = template.dir().to_path_buf();
        let mut resources = template.resources;

        for (namespace_name, namespace) in resources.iter_mut() {
            namespace.functions.retain(|name, _| {
                self.options
                    .function
                    .as_ref()
                    .is_none_or(|selected| selected == name)
            });

            let namespace_name = self
                .options
                .namespace
                .as_deref()
                .unwrap_or(namespace_name);

            for (name, function) in namespace.functions.iter_mut() {
                let code_dir = base_dir.join(&function.properties.code_uri);

                function.code = Some(
                    self.package_function(&code_dir, namespace_name, name)
                        .await?,
                );
            }
        }

        Ok(resources)
    }

    async fn package_function(
        &self,
        code_dir: &Path,
        namespace: &str,
        name: &str,
    ) -> Result<CodeSource, Error> {
        if !code_dir.is_dir() {
            return Err(Error::new(
                ErrorKind::Context,
                &format!(
                    "Function file or path not found by CodeUri \"{}\"",
                    code_dir.display()
                ),
                Some("CodeUri is resolved relative to the template file."),
            ));
        }

        let progress = Progress::new(self.writer, "Compressing", name);
        let archive = Archive::build(code_dir, &self.options.build_dir, namespace, name).await;
        progress.finish();
        let archive = archive?;

        self.writer.stage(
            "Packaged",
            &format!("{name} as {} ({} KB)", archive.name, archive.size() / 1000),
            Status::Success,
        )?;

        match Destination::resolve(
            self.options.without_cos,
            self.options.cos_bucket.as_deref(),
            self.config,
        )? {
            Destination::LocalPath { requested } => {
                if !requested {
                    self.writer.stage(
                        "Info",
                        "To speed up uploads enable COS with `scf configure set --using-cos y`",
                        Status::Info,
                    )?;
                }

                self.local(&archive)
            }

            Destination::ExplicitBucket(bucket) => self.upload(&bucket, &archive).await,

            Destination::DefaultBucket(bucket) => {
                self.writer.stage(
                    "Info",
                    &format!("Uploading to the default COS bucket {bucket}"),
                    Status::Info,
                )?;

                if let Err(error) = self.ensure_bucket(&bucket).await {
                    log::error!("Default bucket {bucket} is not usable: {error:?}");

                    self.writer.stage(
                        "Warning",
                        &format!(
                            "Could not use COS bucket {bucket}: {error}. \
                             The package will be uploaded by the cloud API."
                        ),
                        Status::Warning,
                    )?;

                    return self.local(&archive);
                }

                self.upload(&bucket, &archive).await
            }
        }
    }

    /// Keep the archive on disk to be sent inline
    fn local(&self, archive: &Archive) -> Result<CodeSource, Error> {
        self.options.limits.check(archive.size(), self.writer)?;
        Ok(CodeSource::LocalZip(archive.path.clone()))
    }

    /// Check the bucket exists and create it otherwise
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), ApiError> {
        let progress = Progress::new(self.writer, "Checking", bucket);
        let exists = self.storage.bucket_exists(bucket).await;
        progress.finish();

        if exists? {
            return Ok(());
        }

        log::info!("Bucket {bucket} does not exist, creating");

        let progress = Progress::new(self.writer, "Creating", bucket);
        let created = self.storage.create_bucket(bucket).await;
        progress.finish();
        created
    }

    async fn upload(&self, bucket: &str, archive: &Archive) -> Result<CodeSource, Error> {
        let progress = Progress::new(self.writer, "Uploading", &archive.storage_key);

        let result = self
            .storage
            .put_object(bucket, &archive.storage_key, archive.bytes.clone())
            .await;

        progress.finish();

        result.map_err(|e| {
            upload_error(
                &format!(
                    "Failed to upload {} to COS bucket {bucket}",
                    archive.storage_key
                ),
                &e,
            )
        })?;

        self.writer.stage(
            "Uploaded",
            &format!("{} to COS bucket {bucket}", archive.storage_key),
            Status::Success,
        )?;

        Ok(CodeSource::Cos {
            bucket: self.config.short_bucket_name(bucket),
            object: format!("/{}", archive.storage_key),
        })
    }
}

/// Storage failures abort packaging with the remote request id attached
fn upload_error(message: &str, error: &ApiError) -> Error {
    log::error!("{message}: {error:?}");

    Error::new(ErrorKind::Upload, message, Some(&error.to_string()))
        .with_request_id(error.request_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStorage, StorageCall};
    use std::fs;

    const TEMPLATE: &str = r#"
Resources:
  default:
    Type: TencentCloud::Serverless::Namespace
    hello:
      Type: TencentCloud::Serverless::Function
      Properties:
        CodeUri: ./hello
        Handler: index.main_handler
        Runtime: Python3.6
    world:
      Type: TencentCloud::Serverless::Function
      Properties:
        CodeUri: ./world
        Handler: index.main_handler
        Runtime: Python3.6
"#;

    struct Project {
        dir: tempfile::TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();

            for function in ["hello", "world"] {
                fs::create_dir_all(dir.path().join(function)).unwrap();
                fs::write(dir.path().join(function).join("index.py"), "print(1)").unwrap();
            }

            Project { dir }
        }

        fn template(&self) -> Template {
            Template::parse(TEMPLATE, &self.dir.path().join("template.yaml")).unwrap()
        }

        fn options(&self) -> PackageOptions {
            PackageOptions {
                build_dir: self.dir.path().join(BUILD_DIR),
                ..Default::default()
            }
        }
    }

    fn config(using_cos: bool) -> UserConfig {
        UserConfig {
            appid: "1250000000".into(),
            using_cos,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn name_filter_keeps_only_the_matching_function() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let config = config(false);
        let writer = Writer::new(true);

        let options = PackageOptions {
            function: Some("world".into()),
            ..project.options()
        };

        let resources = Packager::new(&storage, &config, &writer, options)
            .package(project.template())
            .await
            .unwrap();

        let functions: Vec<&String> = resources["default"].functions.keys().collect();
        assert_eq!(functions, vec!["world"]);
    }

    #[tokio::test]
    async fn without_filter_every_function_is_packaged_locally() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let config = config(false);
        let writer = Writer::new(true);

        let resources = Packager::new(&storage, &config, &writer, project.options())
            .package(project.template())
            .await
            .unwrap();

        let hello = &resources["default"].functions["hello"];
        let Some(CodeSource::LocalZip(path)) = &hello.code else {
            panic!("expected a local archive, got {:?}", hello.code);
        };

        assert!(path.ends_with("default-hello-latest.zip"));
        assert!(path.is_file());
        assert_eq!(resources["default"].functions.len(), 2);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn oversized_package_without_cos_fails_before_any_network_call() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let config = config(true);
        let writer = Writer::new(true);

        let options = PackageOptions {
            without_cos: true,
            limits: SizeLimits {
                notice: 1,
                ceiling: 10,
            },
            ..project.options()
        };

        let error = Packager::new(&storage, &config, &writer, options)
            .package(project.template())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Upload);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn default_bucket_without_appid_does_not_fall_back() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let writer = Writer::new(true);

        let config = UserConfig {
            using_cos: true,
            ..Default::default()
        };

        let error = Packager::new(&storage, &config, &writer, project.options())
            .package(project.template())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn explicit_bucket_key_embeds_namespace_and_function() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let config = config(false);
        let writer = Writer::new(true);

        let options = PackageOptions {
            function: Some("hello".into()),
            namespace: Some("staging".into()),
            cos_bucket: Some("code-1250000000".into()),
            ..project.options()
        };

        let resources = Packager::new(&storage, &config, &writer, options)
            .package(project.template())
            .await
            .unwrap();

        let calls = storage.calls();
        let [StorageCall::Put { bucket, key }] = calls.as_slice() else {
            panic!("expected a single upload, got {calls:?}");
        };

        assert_eq!(bucket, "code");
        assert!(key.starts_with("staging-hello-latest-"));
        assert!(key.ends_with(".zip"));

        assert_eq!(
            resources["default"].functions["hello"].code,
            Some(CodeSource::Cos {
                bucket: "code".into(),
                object: format!("/{key}"),
            })
        );
    }

    #[tokio::test]
    async fn missing_default_bucket_is_created_before_upload() {
        let project = Project::new();
        let storage = FakeStorage::default();
        let config = config(true);
        let writer = Writer::new(true);

        let options = PackageOptions {
            function: Some("hello".into()),
            ..project.options()
        };

        let resources = Packager::new(&storage, &config, &writer, options)
            .package(project.template())
            .await
            .unwrap();

        let bucket = "serverless-cloud-function-1250000000".to_string();
        let calls = storage.calls();

        assert_eq!(calls[0], StorageCall::Exists(bucket.clone()));
        assert_eq!(calls[1], StorageCall::Create(bucket.clone()));
        assert!(matches!(&calls[2], StorageCall::Put { bucket: b, .. } if *b == bucket));

        // Stored without the appid suffix
        assert!(matches!(
            &resources["default"].functions["hello"].code,
            Some(CodeSource::Cos { bucket, .. }) if bucket == "serverless-cloud-function"
        ));
    }

    #[tokio::test]
    async fn failed_bucket_creation_degrades_to_local_upload() {
        let project = Project::new();
        let storage = FakeStorage {
            fail_create: true,
            ..Default::default()
        };
        let config = config(true);
        let writer = Writer::new(true);

        let resources = Packager::new(&storage, &config, &writer, project.options())
            .package(project.template())
            .await
            .unwrap();

        assert!(matches!(
            resources["default"].functions["hello"].code,
            Some(CodeSource::LocalZip(_))
        ));

        assert!(!storage
            .calls()
            .iter()
            .any(|call| matches!(call, StorageCall::Put { .. })));
    }

    #[tokio::test]
    async fn failed_bucket_check_degrades_too() {
        let project = Project::new();
        let storage = FakeStorage {
            fail_exists: true,
            ..Default::default()
        };
        let config = config(true);
        let writer = Writer::new(true);

        let resources = Packager::new(&storage, &config, &writer, project.options())
            .package(project.template())
            .await
            .unwrap();

        assert!(matches!(
            resources["default"].functions["world"].code,
            Some(CodeSource::LocalZip(_))
        ));

        // One existence check per function, nothing else
        assert_eq!(storage.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_upload_is_an_upload_error() {
        let project = Project::new();
        let storage = FakeStorage {
            fail_put: true,
            ..Default::default()
        };
        let config = config(false);
        let writer = Writer::new(true);

        let options = PackageOptions {
            cos_bucket: Some("code".into()),
            ..project.options()
        };

        let error = Packager::new(&storage, &config, &writer, options)
            .package(project.template())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Upload);
        assert_eq!(error.request_id(), Some("cos-req"));
    }

    #[tokio::test]
    async fn missing_code_directory_is_reported() {
        let project = Project::new();
        fs::remove_dir_all(project.dir.path().join("world")).unwrap();

        let storage = FakeStorage::default();
        let config = config(false);
        let writer = Writer::new(true);

        let error = Packager::new(&storage, &config, &writer, project.options())
            .package(project.template())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Context);
    }
}
