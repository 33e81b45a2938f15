//! Archive helpers for the backup job.
//!
//! The backup container is a gzip'd tar whose members are themselves opaque
//! blobs (three gzip'd tarballs of directories plus the database dump). All
//! functions here are blocking; async callers go through `spawn_blocking`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::{Archive, Builder};

pub const LOGS_MEMBER: &str = "logs.tgz";
pub const TASK_LOGS_MEMBER: &str = "task_logs.tgz";
pub const BLOBS_MEMBER: &str = "blobs.tgz";

/// Write `source`'s contents as a gzip'd tarball at `destination`.
pub fn bundle_directory(source: &Path, destination: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", source.display()),
        ));
    }

    let file = File::create(destination)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(".", source)?;

    let mut writer = builder.into_inner()?.finish()?;
    writer.flush()
}

/// Pack `(name, path)` members into a gzip'd tar written to `writer`.
pub fn pack_members<W: Write>(writer: W, members: &[(String, PathBuf)]) -> io::Result<W> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = Builder::new(encoder);
    for (name, path) in members {
        builder.append_path_with_name(path, name)?;
    }
    builder.into_inner()?.finish()
}

/// Names of the regular-file members of a gzip'd tar.
pub fn member_names(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        if entry.header().entry_type().is_file() {
            names.push(entry.path()?.to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
