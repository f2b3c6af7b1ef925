use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use crate::util::{Error, Result};


const CHUNK_SIZE: usize = 4096;


/// How the output file is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PadMode {
    /// Create the file, truncating any existing content.
    #[default]
    Overwrite,
    /// Create the file if needed and write after its existing content.
    Append,
}


/// A single sizing operation. See [`size_file`].
#[derive(Clone, Debug)]
pub struct PadRequest {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub size: u64,
    pub fill: u8,
    pub mode: PadMode,
}

impl PadRequest {
    pub fn new(output: impl Into<PathBuf>, size: u64) -> Self {
        PadRequest {
            input: None,
            output: output.into(),
            size,
            fill: 0,
            mode: PadMode::default(),
        }
    }

    pub fn input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    pub fn mode(mut self, mode: PadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn run(&self) -> Result<()> {
        size_file(
            self.input.as_deref(),
            &self.output,
            self.size,
            self.fill,
            self.mode,
        )
    }
}


/// Writes `size` bytes to `output`.
///
/// With an `input`, its contents are copied and the rest of `size` is
/// filled with `fill`. An input longer than `size` is an error.
///
/// Without an `input`, `output` is grown to `size` bytes with `fill`. An
/// existing output larger than `size` is an error and is left untouched in
/// either mode, since that check runs before the output is opened; files
/// are never shrunk. Otherwise [`PadMode::Overwrite`] truncates the output
/// on open, so the result is `size` bytes of `fill`.
///
/// A failed write leaves whatever was already written on disk.
pub fn size_file(
    input: Option<&Path>,
    output: &Path,
    size: u64,
    fill: u8,
    mode: PadMode,
) -> Result<()> {
    let span = info_span!("size_file", output = %output.display());
    let _enter = span.enter();

    let (mut outfile, remaining) = match input {
        Some(input_path) => {
            let mut infile = File::open(input_path).map_err(|source| Error::OpenFailed {
                path: input_path.to_path_buf(),
                source,
            })?;
            let mut outfile = open_output(output, mode)?;
            let remaining = copy_input(&mut infile, input_path, &mut outfile, output, size)?;
            (outfile, remaining)
        }
        None => {
            check_existing_size(output, size)?;
            let outfile = open_output(output, mode)?;
            let current = outfile
                .metadata()
                .map_err(|source| Error::StatFailed {
                    path: output.to_path_buf(),
                    source,
                })?
                .len();
            let remaining = size.checked_sub(current).ok_or_else(|| Error::SizeExceeded {
                path: output.to_path_buf(),
                current,
                target: size,
            })?;
            debug!(current, "resizing existing output");
            (outfile, remaining)
        }
    };

    fill_output(&mut outfile, output, fill, remaining)
}


fn open_output(path: &Path, mode: PadMode) -> Result<File> {
    let mut options = OpenOptions::new();
    match mode {
        PadMode::Overwrite => options.write(true).create(true).truncate(true),
        PadMode::Append => options.append(true).create(true),
    };
    options.open(path).map_err(|source| Error::OpenFailed {
        path: path.to_path_buf(),
        source,
    })
}


fn check_existing_size(path: &Path, size: u64) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.len() > size => Err(Error::SizeExceeded {
            path: path.to_path_buf(),
            current: metadata.len(),
            target: size,
        }),
        Ok(_) => Ok(()),
        // Opening the output will create it
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::StatFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}


/// Reads until `buf` is full or the reader is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}


/// Copies at most `size` bytes and returns how many are left to fill.
fn copy_input(
    infile: &mut impl Read,
    input_path: &Path,
    outfile: &mut impl Write,
    output_path: &Path,
    size: u64,
) -> Result<u64> {
    let read_error = |source: std::io::Error| Error::ReadFailed {
        path: input_path.to_path_buf(),
        source,
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let now = remaining.min(CHUNK_SIZE as u64) as usize;
        let read = read_full(infile, &mut buf[..now]).map_err(read_error)?;

        outfile
            .write_all(&buf[..read])
            .map_err(|source| Error::WriteFailed {
                path: output_path.to_path_buf(),
                source,
            })?;
        remaining -= read as u64;

        if read < now {
            debug!(copied = size - remaining, "input exhausted");
            return Ok(remaining);
        }
    }

    // All of `size` was copied, so the input must be at its end
    if read_full(infile, &mut buf[..1]).map_err(read_error)? > 0 {
        return Err(Error::InputTooLarge {
            path: input_path.to_path_buf(),
            target: size,
        });
    }

    debug!(copied = size, "input fills output exactly");
    Ok(0)
}


fn fill_output(outfile: &mut impl Write, path: &Path, fill: u8, mut remaining: u64) -> Result<()> {
    debug!(remaining, fill, "filling");

    let buf = [fill; CHUNK_SIZE];
    while remaining > 0 {
        let now = remaining.min(CHUNK_SIZE as u64) as usize;
        outfile
            .write_all(&buf[..now])
            .map_err(|source| Error::WriteFailed {
                path: path.to_path_buf(),
                source,
            })?;
        remaining -= now as u64;
    }
    Ok(())
}
