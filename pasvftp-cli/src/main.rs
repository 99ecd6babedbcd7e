//! # pasvftp client
//!
//! Interactive client to work with FTP servers in passive mode.
//! Install it with `cargo install pasvftp-cli`
//!

// -- mods
mod actions;
mod args;
mod command;

use std::io;
use std::io::Write;
use std::str::FromStr;

use actions::*;
use args::Args;
use command::Command;
use env_logger::Builder as LogBuilder;
use log::LevelFilter;
use pasvftp::{FileMode, FtpConfig};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

fn usage() {
    println!("Available commands:");
    println!("APPE <file> <dest>                  Append content of local file `file` to `dest`");
    println!("CONNECT <addr[:port]>               Select the remote host");
    println!("GET <file> <dest>                   Download `file` to `dest`");
    println!("HELP                                Print this help");
    println!("LOGIN                               Login to remote");
    println!("LS [dir]                            List names. If directory is not provided, current directory is used");
    println!("MKDIR <dir>                         Create directory");
    println!("NOOP                                Ping server");
    println!("PUT <file> <dest>                   Upload local file `file` to `dest`");
    println!("QUIT                                Quit pasvftp");
    println!("RM <file>                           Remove file");
    println!("RMDIR <dir>                         Remove directory");
    println!("SIZE <file>                         Get `file` size");
    println!("TYPE <A|I>                          Set transfer type (ascii or binary)");
}

fn input() -> io::Result<Command> {
    loop {
        print!(">> ");
        let _ = io::stdout().flush();
        let mut input: String = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // stdin closed
            return Ok(Command::Quit);
        }
        // Try to create command
        match Command::from_str(input.as_str()) {
            Ok(cmd) => return Ok(cmd),
            Err(err) => println!("{err}"),
        }
    }
}

fn main() {
    let args: Args = argh::from_env();
    // print version
    if args.version {
        println!("pasvftp {APP_VERSION} - developed by {APP_AUTHORS}")
    }
    // init logger
    LogBuilder::new()
        .filter_level(if args.debug {
            LevelFilter::Trace
        } else if args.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Off
        })
        .init();
    let config = FtpConfig::default()
        .max_sessions(args.sessions)
        .passive_nat_workaround(args.nat);
    // Main loop
    let mut remote: Option<Remote> = None;

    // connect if host is specified
    if let Some(host) = args.host {
        perform(&mut remote, &config, Command::Connect(host));
    }

    loop {
        match input() {
            Ok(Command::Quit) => {
                // Break if quit
                quit(remote);
                break;
            }
            Ok(Command::Help) => usage(),
            Ok(cmd) => perform(&mut remote, &config, cmd),
            Err(err) => {
                eprintln!("Failed to read stdin: {err}");
                quit(remote);
                break;
            }
        }
    }
}

fn perform(remote: &mut Option<Remote>, config: &FtpConfig, command: Command) {
    match command {
        Command::Connect(addr) => {
            if let Some(previous) = remote.take() {
                quit(Some(previous));
            }
            *remote = connect(addr.as_str(), config.clone());
        }
        command => match remote {
            Some(remote) if remote.logged_in => perform_connected(remote, command),
            Some(remote) => match command {
                Command::Login => login(remote),
                _ => eprintln!("Can't perform command: you must login first"),
            },
            None => eprintln!("Can't perform command: you must connect to remote first"),
        },
    }
}

fn perform_connected(remote: &mut Remote, command: Command) {
    if let Command::Login = command {
        return login(remote);
    }
    let ftp = &mut remote.ftp;
    match command {
        Command::Appe(src, dest) => put(ftp, src.as_path(), dest.as_str(), FileMode::Append),
        Command::Get(file, dest) => get(ftp, file.as_str(), dest.as_path()),
        Command::Ls(p) => list(ftp, p.as_deref()),
        Command::Mkdir(p) => mkdir(ftp, p.as_str()),
        Command::Noop => noop(ftp),
        Command::Put(src, dest) => put(ftp, src.as_path(), dest.as_str(), FileMode::Write),
        Command::Rm(file) => rm(ftp, file.as_str()),
        Command::Rmdir(dir) => rmdir(ftp, dir.as_str()),
        Command::Size(file) => size(ftp, file.as_str()),
        Command::Type(file_type) => set_type(ftp, file_type),
        Command::Connect(_) | Command::Help | Command::Login | Command::Quit => {
            eprintln!("Something unexpected happened")
        }
    }
}
