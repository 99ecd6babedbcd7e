use std::fs::File;
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::Path;

use pasvftp::{FileMode, FileType, FtpClient, FtpConfig, TcpTransport, DEFAULT_PORT};

/// A server selected with `CONNECT`; sessions are opened on `LOGIN`
pub struct Remote {
    pub ftp: FtpClient<TcpTransport>,
    pub ip: IpAddr,
    pub logged_in: bool,
}

pub fn quit(remote: Option<Remote>) {
    if let Some(mut remote) = remote {
        remote.ftp.end();
        println!("OK");
    }
}

pub fn connect(remote: &str, config: FtpConfig) -> Option<Remote> {
    let addr = match resolve(remote) {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("Failed to resolve remote: {}", err);
            return None;
        }
    };
    let ftp = FtpClient::tcp(config.port(addr.port()));
    println!("OK: {addr}; LOGIN to open a session");
    Some(Remote {
        ftp,
        ip: addr.ip(),
        logged_in: false,
    })
}

fn resolve(remote: &str) -> io::Result<SocketAddr> {
    let remote = if remote.contains(':') {
        remote.to_string()
    } else {
        format!("{remote}:{DEFAULT_PORT}")
    };
    remote
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address for host"))
}

pub fn login(remote: &mut Remote) {
    // Read username
    print!("Username: ");
    let _ = io::stdout().flush();
    let mut username = String::new();
    if let Err(err) = io::stdin().read_line(&mut username) {
        eprintln!("Could not read username: {}", err);
        return;
    }
    // Read password
    let password: String = match rpassword::prompt_password("Password: ") {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Could not read password: {}", err);
            return;
        }
    };
    // Sessions of a previous login would keep the old credentials
    if remote.logged_in {
        remote.ftp.end();
        remote.logged_in = false;
    }
    // Login
    match remote
        .ftp
        .begin(remote.ip, Some(username.trim()), Some(password.as_str()))
    {
        Ok(_) => {
            remote.logged_in = true;
            // Set transfer type to binary
            if let Err(err) = remote.ftp.binary() {
                eprintln!("Failed to set transfer type to binary: {}", err);
            }
            println!("OK");
        }
        Err(err) => eprintln!("LOGIN error: {}", err),
    }
}

pub fn list(ftp: &mut FtpClient<TcpTransport>, p: Option<&str>) {
    match ftp.ls(p) {
        Ok(entries) => entries.for_each(|f| println!("{}", f)),
        Err(err) => eprintln!("LS error: {}", err),
    }
}

pub fn get(ftp: &mut FtpClient<TcpTransport>, file: &str, dest: &Path) {
    let mut dest: File = match File::create(dest) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("Failed to open destination file: {}", err);
            return;
        }
    };
    let mut reader = match ftp.open(file, FileMode::Read) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("GET error: {}", err);
            return;
        }
    };
    match io::copy(&mut reader, &mut dest) {
        Ok(bytes) => {
            if reader.close() {
                println!("OK: {} bytes", bytes)
            } else {
                eprintln!("GET incomplete: server did not confirm {} bytes", bytes)
            }
        }
        Err(err) => {
            let _ = reader.cancel();
            eprintln!("GET error: {}", err)
        }
    }
}

pub fn put(ftp: &mut FtpClient<TcpTransport>, local: &Path, dest: &str, mode: FileMode) {
    let mut reader = match File::open(local) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to open local file for read: {}", err);
            return;
        }
    };
    let mut writer = match ftp.open(dest, mode) {
        Ok(w) => w,
        Err(err) => {
            eprintln!("PUT error: {}", err);
            return;
        }
    };
    match io::copy(&mut reader, &mut writer).and_then(|bytes| writer.flush().map(|_| bytes)) {
        Ok(bytes) => {
            if writer.close() {
                println!("OK: {} bytes", bytes)
            } else {
                eprintln!("PUT incomplete: server did not confirm {} bytes", bytes)
            }
        }
        Err(err) => {
            let _ = writer.cancel();
            eprintln!("PUT error: {}", err)
        }
    }
}

pub fn mkdir(ftp: &mut FtpClient<TcpTransport>, dir: &str) {
    match ftp.mkdir(dir) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("MKDIR error: {}", err),
    }
}

pub fn noop(ftp: &mut FtpClient<TcpTransport>) {
    match ftp.session().and_then(|s| s.try_with(|s| s.noop())) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("NOOP error: {}", err),
    }
}

pub fn rm(ftp: &mut FtpClient<TcpTransport>, file: &str) {
    match ftp.remove(file) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RM error: {}", err),
    }
}

pub fn rmdir(ftp: &mut FtpClient<TcpTransport>, dir: &str) {
    match ftp.rmdir(dir) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RMDIR error: {}", err),
    }
}

pub fn size(ftp: &mut FtpClient<TcpTransport>, file: &str) {
    match ftp.size(file) {
        Ok(size) => println!("OK: {}", size),
        Err(err) => eprintln!("SIZE error: {}", err),
    }
}

pub fn set_type(ftp: &mut FtpClient<TcpTransport>, file_type: FileType) {
    match ftp.transfer_type(file_type) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("TYPE error: {}", err),
    }
}
