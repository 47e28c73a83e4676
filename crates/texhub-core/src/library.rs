/// Copying textures into category folders and the shared library.
///
/// Copies never overwrite: a taken name gets a numeric suffix
/// (`brick.png`, `brick 1.png`, `brick 2.png`, ...). Every copy gets a
/// fresh `.meta` guid so it is indexed as a distinct asset. Importer
/// settings in the source sidecar are carried over.
use crate::config::TexHubConfig;
use crate::error::LibraryError;
use crate::host::fs::is_texture_path;
use crate::host::{meta, AssetHost};
use crate::model::{AssetId, AssetRecord, Category};
use crate::scanner;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Absolute folder for `category` in the project at `root`.
pub fn category_folder(root: &Path, config: &TexHubConfig, category: Category) -> PathBuf {
    scanner::category_folder(&root.join(&config.paths.hub_dir), category)
}

/// Create `category`'s folder if it does not exist yet.
pub fn ensure_category_folder(
    root: &Path,
    config: &TexHubConfig,
    category: Category,
) -> Result<PathBuf, LibraryError> {
    let dir = category_folder(root, config, category);
    fs::create_dir_all(&dir).map_err(|source| LibraryError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Copy textures into `category`'s folder.
///
/// Each source is either a texture file or a directory whose textures are
/// copied recursively. Non-image files are skipped. Nothing is copied if
/// any source is missing. Returns the new paths; the caller is expected to
/// run a full scan afterwards.
pub fn add_to_category(
    host: &dyn AssetHost,
    root: &Path,
    config: &TexHubConfig,
    category: Category,
    sources: &[PathBuf],
) -> Result<Vec<PathBuf>, LibraryError> {
    if let Some(missing) = sources.iter().find(|s| !s.exists()) {
        return Err(LibraryError::Missing(missing.clone()));
    }

    let dest_dir = ensure_category_folder(root, config, category)?;
    let mut copied = Vec::new();

    for source in sources {
        if source.is_dir() {
            let textures = host
                .textures_under(source)
                .map_err(|err| LibraryError::Io {
                    path: source.clone(),
                    source: io::Error::other(err.to_string()),
                })?;
            for asset in textures {
                copied.push(copy_asset(&asset.location, &dest_dir)?);
            }
        } else if is_texture_path(source) {
            copied.push(copy_asset(source, &dest_dir)?);
        } else {
            debug!("Skipping non-texture {}", source.display());
        }
    }

    info!("Added {} textures to {category}", copied.len());
    Ok(copied)
}

/// Copy a record's file into the library folder.
pub fn copy_to_library(
    root: &Path,
    config: &TexHubConfig,
    record: &AssetRecord,
) -> Result<PathBuf, LibraryError> {
    let library = root.join(&config.paths.library_dir);
    let source = if record.location.is_absolute() {
        record.location.clone()
    } else {
        root.join(&record.location)
    };

    if is_within(&source, &library) {
        warn!("{} is already in the library", source.display());
        return Err(LibraryError::AlreadyInLibrary(source));
    }
    if !source.is_file() {
        return Err(LibraryError::Missing(source));
    }

    fs::create_dir_all(&library).map_err(|source| LibraryError::Io {
        path: library.clone(),
        source,
    })?;
    copy_asset(&source, &library)
}

/// `true` if `path` lies anywhere under `dir`. Compares canonical paths when
/// both exist so `..` segments and symlinks cannot dodge the check.
fn is_within(path: &Path, dir: &Path) -> bool {
    match (path.canonicalize(), dir.canonicalize()) {
        (Ok(path), Ok(dir)) => path.starts_with(dir),
        _ => path.starts_with(dir),
    }
}

/// Copy `source` into `dest_dir` under a free name, with a new identity.
pub fn copy_asset(source: &Path, dest_dir: &Path) -> Result<PathBuf, LibraryError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| LibraryError::Missing(source.to_path_buf()))?;
    let mut input = File::open(source).map_err(|err| match err.kind() {
        ErrorKind::NotFound => LibraryError::Missing(source.to_path_buf()),
        _ => LibraryError::Io {
            path: source.to_path_buf(),
            source: err,
        },
    })?;

    let (dest, mut output) = create_unique(dest_dir, Path::new(file_name))?;
    let io_err = |source| LibraryError::Io {
        path: dest.clone(),
        source,
    };
    io::copy(&mut input, &mut output).map_err(io_err)?;

    let guid = meta::new_guid();
    write_copied_meta(source, &dest, &guid).map_err(io_err)?;
    info!("Copied {} to {}", source.display(), dest.display());
    Ok(dest)
}

/// Candidate names for `file_name` in `dir`: the name itself, then
/// `stem 1.ext`, `stem 2.ext`, ...
pub fn numbered_name(file_name: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return file_name.to_path_buf();
    }
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.extension() {
        Some(ext) => PathBuf::from(format!("{stem} {n}.{}", ext.to_string_lossy())),
        None => PathBuf::from(format!("{stem} {n}")),
    }
}

/// Open the first free numbered name with `create_new`, so a file that
/// appears concurrently is never overwritten.
fn create_unique(dir: &Path, file_name: &Path) -> Result<(PathBuf, File), LibraryError> {
    let mut n = 0;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(source) => {
                return Err(LibraryError::Io {
                    path: candidate,
                    source,
                })
            }
        }
    }
}

/// Sidecar for a copy: the source's sidecar with its guid replaced, or a
/// minimal one when the source has none.
fn write_copied_meta(source: &Path, dest: &Path, guid: &AssetId) -> io::Result<()> {
    match fs::read_to_string(meta::meta_path(source)) {
        Ok(content) if meta::parse_guid(&content).is_some() => {
            let rewritten: Vec<String> = content
                .lines()
                .map(|line| {
                    if line.trim_start().starts_with("guid:") {
                        format!("guid: {guid}")
                    } else {
                        line.to_string()
                    }
                })
                .collect();
            fs::write(meta::meta_path(dest), rewritten.join("\n") + "\n")
        }
        _ => meta::write_meta(dest, guid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FsHost;
    use crate::model::Candidate;
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_numbered_names() {
        assert_eq!(numbered_name(Path::new("brick.png"), 0), PathBuf::from("brick.png"));
        assert_eq!(numbered_name(Path::new("brick.png"), 2), PathBuf::from("brick 2.png"));
        assert_eq!(numbered_name(Path::new("README"), 1), PathBuf::from("README 1"));
    }

    #[test]
    fn test_copy_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src/brick.png");
        write_png(&source);
        let dest_dir = tmp.path().join("dest");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("brick.png"), b"existing").unwrap();

        let first = copy_asset(&source, &dest_dir).unwrap();
        let second = copy_asset(&source, &dest_dir).unwrap();

        assert_eq!(first, dest_dir.join("brick 1.png"));
        assert_eq!(second, dest_dir.join("brick 2.png"));
        assert_eq!(fs::read(dest_dir.join("brick.png")).unwrap(), b"existing");
        assert_eq!(fs::read(&first).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn test_copy_gets_fresh_guid_and_keeps_settings() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_png(&source);
        fs::write(
            meta::meta_path(&source),
            "fileFormatVersion: 2\nguid: 0123456789abcdef0123456789abcdef\nwrapMode: 1\n",
        )
        .unwrap();

        let err = copy_asset(&source, &tmp.path().join("lib")).unwrap_err();
        // copy_asset does not create the destination folder.
        assert!(matches!(err, LibraryError::Io { .. }));

        fs::create_dir_all(tmp.path().join("lib")).unwrap();
        let dest = copy_asset(&source, &tmp.path().join("lib")).unwrap();
        let copied_meta = fs::read_to_string(meta::meta_path(&dest)).unwrap();
        let guid = meta::parse_guid(&copied_meta).unwrap();
        assert_ne!(guid.as_str(), "0123456789abcdef0123456789abcdef");
        assert_eq!(guid.as_str().len(), 32);
        assert!(copied_meta.contains("wrapMode: 1"));
    }

    #[test]
    fn test_add_to_category_filters_and_recurses() {
        let tmp = TempDir::new().unwrap();
        let config = TexHubConfig::default();
        let host = FsHost::new(tmp.path(), &config);
        let pack = tmp.path().join("Assets/Pack");
        write_png(&pack.join("a.png"));
        write_png(&pack.join("nested/b.png"));
        fs::write(pack.join("notes.txt"), b"hi").unwrap();
        let single = tmp.path().join("Assets/c.png");
        write_png(&single);

        let copied = add_to_category(
            &host,
            tmp.path(),
            &config,
            Category::Tiling,
            &[pack, single, tmp.path().join("Assets/readme.md")],
        );
        // readme.md does not exist, so nothing was copied.
        assert!(matches!(copied, Err(LibraryError::Missing(_))));
        assert!(!category_folder(tmp.path(), &config, Category::Tiling).exists());

        let copied = add_to_category(
            &host,
            tmp.path(),
            &config,
            Category::Tiling,
            &[tmp.path().join("Assets/Pack"), tmp.path().join("Assets/c.png")],
        )
        .unwrap();
        assert_eq!(copied.len(), 3);
        let folder = category_folder(tmp.path(), &config, Category::Tiling);
        assert!(copied.iter().all(|p| p.parent() == Some(folder.as_path())));
        assert!(!folder.join("notes.txt").exists());
    }

    #[test]
    fn test_copy_to_library_refuses_library_files() {
        let tmp = TempDir::new().unwrap();
        let config = TexHubConfig::default();
        let library = tmp.path().join(&config.paths.library_dir);
        let inside = library.join("x.png");
        write_png(&inside);

        let record = AssetRecord::new(Candidate::new(AssetId::new("x"), inside, Category::Mask));
        assert!(matches!(
            copy_to_library(tmp.path(), &config, &record),
            Err(LibraryError::AlreadyInLibrary(_))
        ));

        let outside = tmp.path().join("Assets/y.png");
        write_png(&outside);
        let record = AssetRecord::new(Candidate::new(AssetId::new("y"), outside, Category::Mask));
        let copied = copy_to_library(tmp.path(), &config, &record).unwrap();
        assert_eq!(copied, library.join("y.png"));
    }

    #[test]
    fn test_copy_to_library_refuses_library_subfolders() {
        let tmp = TempDir::new().unwrap();
        let config = TexHubConfig::default();
        let library = tmp.path().join(&config.paths.library_dir);
        let nested = library.join("Stone/Walls/z.png");
        write_png(&nested);

        let record = AssetRecord::new(Candidate::new(AssetId::new("z"), nested, Category::Tiling));
        assert!(matches!(
            copy_to_library(tmp.path(), &config, &record),
            Err(LibraryError::AlreadyInLibrary(_))
        ));

        // Same file reached through a `..` detour.
        let detour = library.join("Stone/../Stone/Walls/z.png");
        let record = AssetRecord::new(Candidate::new(AssetId::new("z"), detour, Category::Tiling));
        assert!(matches!(
            copy_to_library(tmp.path(), &config, &record),
            Err(LibraryError::AlreadyInLibrary(_))
        ));
        assert_eq!(fs::read_dir(library.join("Stone/Walls")).unwrap().count(), 1);
    }
}
