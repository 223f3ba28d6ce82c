use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::{ErrorCode, Session, Sftp};
use tracing::debug;
use webpnp_core::ResultServerConfig;

use crate::archive::{ArchiveConnector, ArchiveSession};

// LIBSSH2_FX_NO_SUCH_FILE
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Password-authenticated SFTP access to the result server
pub struct SftpConnector {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl SftpConnector {
    pub fn new(server: &ResultServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            username: server.username.clone(),
            password: server.password.clone(),
        }
    }
}

impl ArchiveConnector for SftpConnector {
    fn connect(&self) -> io::Result<Box<dyn ArchiveSession>> {
        debug!("Connecting to {}@{}:{}", self.username, self.host, self.port);

        let tcp = TcpStream::connect((self.host.as_str(), self.port))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_password(&self.username, &self.password)?;
        let sftp = session.sftp()?;

        Ok(Box::new(SftpSession { session, sftp }))
    }
}

struct SftpSession {
    session: Session,
    sftp: Sftp,
}

impl ArchiveSession for SftpSession {
    fn exists(&mut self, path: &str) -> io::Result<bool> {
        match self.sftp.stat(Path::new(path)) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_dir_all(&mut self, path: &str) -> io::Result<()> {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            if !self.exists(&current)? {
                debug!("Creating remote directory {}", current);
                self.sftp.mkdir(Path::new(&current), 0o755)?;
            }
        }
        Ok(())
    }

    fn list_files(&mut self, dir: &str) -> io::Result<Vec<String>> {
        let entries = self.sftp.readdir(Path::new(dir))?;
        Ok(entries
            .into_iter()
            .filter(|(_, stat)| stat.is_file())
            .filter_map(|(path, _)| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .collect())
    }

    fn download(&mut self, remote: &str, dest: &mut dyn Write) -> io::Result<u64> {
        let mut file = self.sftp.open(Path::new(remote))?;
        io::copy(&mut file, dest)
    }

    fn upload(&mut self, src: &mut dyn Read, remote: &str) -> io::Result<u64> {
        let partial = format!("{}.part", remote);
        let written = {
            let mut file = self.sftp.create(Path::new(&partial))?;
            io::copy(src, &mut file)?
        };
        self.sftp.rename(Path::new(&partial), Path::new(remote), None)?;
        Ok(written)
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.session
            .disconnect(None, "webpnp sync complete", None)
            .map_err(io::Error::from)
    }
}
