use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "Interactive passive-mode FTP client, based on pasvftp")]
pub struct Args {
    #[argh(switch, short = 'D', description = "enable TRACE log level")]
    pub debug: bool,
    #[argh(switch, short = 'v', description = "verbose mode")]
    pub verbose: bool,
    #[argh(switch, short = 'V', description = "print version")]
    pub version: bool,
    #[argh(
        option,
        short = 's',
        default = "4",
        description = "maximum amount of concurrent sessions"
    )]
    pub sessions: usize,
    #[argh(
        switch,
        description = "connect data channels to the server address instead of the one it advertises"
    )]
    pub nat: bool,
    #[argh(positional, description = "host to connect to")]
    pub host: Option<String>,
}
