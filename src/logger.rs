use std::cell::Cell;
use std::fmt;
use std::fs::File;
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
thread_local! {
    static BLOB_OFFSET: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Recoverable oddity noticed while decoding. Failures are reported through
/// [`crate::Error`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The tile stream consumed a different number of bytes than the data
    /// record declares.
    TileStreamSize { consumed: usize, declared: u32 },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileStreamSize { consumed, declared } => write!(
                f,
                "tile stream used {consumed} bytes, data record declares {declared}"
            ),
        }
    }
}

/// Configures a log file that receives every warning in addition to stderr.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn set_log_file(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    // The first installed file stays in place.
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

/// Tags warnings on this thread with the offset of the blob being decoded
/// until the returned guard is dropped.
pub fn scope_blob(offset: usize) -> BlobScope {
    let previous = BLOB_OFFSET.with(|slot| slot.replace(Some(offset)));
    BlobScope { previous }
}

#[must_use = "the blob scope ends as soon as the guard is dropped"]
pub struct BlobScope {
    previous: Option<usize>,
}

impl Drop for BlobScope {
    fn drop(&mut self) {
        BLOB_OFFSET.with(|slot| slot.set(self.previous));
    }
}

fn render(warning: &DecodeWarning) -> String {
    BLOB_OFFSET.with(Cell::get).map_or_else(
        || format!("lerc1: {warning}"),
        |offset| format!("lerc1 blob at offset {offset}: {warning}"),
    )
}

pub fn warn(warning: &DecodeWarning) {
    let message = render(warning);
    eprintln!("{message}");
    if let Some(writer) = LOG_FILE.get()
        && let Ok(mut file) = writer.lock()
    {
        let _ = writeln!(file, "warning: {message}");
    }
}
