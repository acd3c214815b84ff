use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tracing_subscriber::fmt::MakeWriter;

/// Trace log sink that creates its file on the first write and recreates it after deletion
#[derive(Clone)]
pub struct LazyFileWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LazyFileWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path { &self.path }
}

/// Per-event writer handed out by [`LazyFileWriter`]
pub struct LazyWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl LazyWriter {
    fn lock(&self) -> io::Result<MutexGuard<'_, Option<File>>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("trace log writer lock poisoned"))
    }
}

impl Write for LazyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self.lock()?;
        if !self.path.exists() {
            *slot = None;
        }
        let file = match slot.take() {
            Some(file) => file,
            None => open_append(&self.path)?,
        };

        let (file, written) = match (&file).write(buf) {
            Ok(written) => (file, written),
            // stale handle
            Err(_) => {
                let mut reopened = open_append(&self.path)?;
                let written = reopened.write(buf)?;
                (reopened, written)
            },
        };
        *slot = Some(file);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self.lock()?;
        if !self.path.exists() {
            *slot = None;
            return Ok(());
        }
        if let Some(file) = slot.as_mut()
            && file.flush().is_err()
        {
            *slot = None;
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LazyFileWriter {
    type Writer = LazyWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LazyWriter {
            path: self.path.clone(),
            file: Arc::clone(&self.file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_is_created_on_first_write() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("trace.log");
        let writer = LazyFileWriter::new(path.clone());

        assert!(!path.exists());
        let mut event = writer.make_writer();
        assert!(event.write_all(b"first\n").is_ok());
        assert!(event.flush().is_ok());
        assert_eq!(std::fs::read_to_string(&path).unwrap_or_default(), "first\n");
    }

    #[test]
    fn test_deleted_file_is_recreated() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("trace.log");
        let writer = LazyFileWriter::new(path.clone());

        assert!(writer.make_writer().write_all(b"one\n").is_ok());
        assert!(std::fs::remove_file(&path).is_ok());
        assert!(writer.make_writer().flush().is_ok());
        assert!(writer.make_writer().write_all(b"two\n").is_ok());
        assert_eq!(std::fs::read_to_string(writer.path()).unwrap_or_default(), "two\n");
    }
}
