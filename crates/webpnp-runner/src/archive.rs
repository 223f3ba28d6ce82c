use std::io::{self, Read, Write};

/// One open connection to the remote result archive.
/// Paths are remote, `/`-separated.
pub trait ArchiveSession: Send {
    fn exists(&mut self, path: &str) -> io::Result<bool>;

    fn create_dir_all(&mut self, path: &str) -> io::Result<()>;

    /// Names of the regular files directly inside `dir`
    fn list_files(&mut self, dir: &str) -> io::Result<Vec<String>>;

    fn download(&mut self, remote: &str, dest: &mut dyn Write) -> io::Result<u64>;

    fn upload(&mut self, src: &mut dyn Read, remote: &str) -> io::Result<u64>;

    fn disconnect(&mut self) -> io::Result<()>;
}

/// Opens archive sessions
pub trait ArchiveConnector: Send + Sync {
    fn connect(&self) -> io::Result<Box<dyn ArchiveSession>>;
}
