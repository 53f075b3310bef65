use bytes::Bytes;
use chrono::{DateTime, Local};
use eyre::WrapErr;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zipped code of one function
#[derive(Debug, Clone)]
pub(crate) struct Archive {
    /// File name in the build directory
    pub(crate) name: String,

    /// Object key in the storage, unique per upload
    pub(crate) storage_key: String,

    /// Location of the archive in the build directory
    pub(crate) path: PathBuf,

    pub(crate) bytes: Bytes,
}

impl Archive {
    /// Compress the code directory and write the result to the build directory
    ///
    /// A previous archive with the same name gets replaced.
    pub(crate) async fn build(
        code_dir: &Path,
        build_dir: &Path,
        namespace: &str,
        function: &str,
    ) -> eyre::Result<Self> {
        let (name, storage_key) = archive_names(namespace, function, Local::now());
        let code_dir = code_dir.to_path_buf();

        // Zip crate doesn't have async support, so we have to use a blocking task here
        let bytes = tokio::task::spawn_blocking(move || zip_dir(&code_dir))
            .await
            .wrap_err("Failed to spawn the blocking task")?
            .wrap_err("Failed to create a Zip archive")?;

        tokio::fs::create_dir_all(build_dir)
            .await
            .wrap_err(format!("Failed to create build dir {build_dir:?}"))?;

        let path = build_dir.join(&name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .wrap_err(format!("Failed to remove previous archive {path:?}"))?;
        }

        tokio::fs::write(&path, &bytes)
            .await
            .wrap_err(format!("Failed to write archive {path:?}"))?;

        Ok(Archive {
            name,
            storage_key,
            path,
            bytes: Bytes::from(bytes),
        })
    }

    pub(crate) fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Build directory name and storage key of a function's archive
pub(crate) fn archive_names(
    namespace: &str,
    function: &str,
    now: DateTime<Local>,
) -> (String, String) {
    let base = format!("{namespace}-{function}-latest");

    (
        format!("{base}.zip"),
        format!("{base}-{}.zip", now.format("%Y-%m-%d-%H-%M-%S")),
    )
}

/// Dot-prefixed entries right under the code directory
fn is_hidden_root_entry(entry: &DirEntry) -> bool {
    entry.depth() == 1
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Deflate every file of the directory into an in-memory zip
///
/// Entries are sorted and carry a fixed timestamp, so the same tree always yields the same bytes.
pub(crate) fn zip_dir(src: &Path) -> eyre::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden_root_entry(entry));

    for entry in walker {
        let entry = entry.wrap_err(format!("Failed to read {src:?}"))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .strip_prefix(src)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        #[allow(unused_mut)]
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        // Keep the executable bit, handlers of custom runtimes rely on it
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options = options.unix_permissions(entry.metadata()?.permissions().mode());
        }

        zip.start_file(name.as_str(), options)
            .wrap_err("Could not open ZIP file")?;

        zip.write_all(&fs::read(entry.path())?)
            .wrap_err("Could not write to ZIP file")?;
    }

    Ok(zip
        .finish()
        .wrap_err("Could not close ZIP file")?
        .into_inner())
}
