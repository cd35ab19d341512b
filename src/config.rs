//! CLI arguments and server configuration defaults.

use clap::Parser;
use shadow_rs::formatcp;

use crate::build;

const VERSION_INFO: &str = formatcp!(
    r#"{}\ncommit_hash: {}\nbuild_time: {}\nbuild_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

pub const DEFAULT_STORAGE_DIR: &str = "uploads";
pub const DEFAULT_PORT: u16 = 8080;
pub const DOWNLOAD_ROUTE: &str = "/download";
pub const UPLOAD_FIELD_NAME: &str = "uploadFile";
pub const DELETE_FIELD_NAME: &str = "file";

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "dropshelf", version = VERSION_INFO, about = "Minimal file upload server")]
pub struct Args {
    #[arg(
        short = 's',
        long,
        env = "DROPSHELF_STORAGE_DIR",
        default_value = DEFAULT_STORAGE_DIR,
        help = "Directory uploaded files are written to"
    )]
    pub storage_dir: String,
    #[arg(
        short = 'b',
        long,
        env = "DROPSHELF_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "DROPSHELF_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "DROPSHELF_UPLOAD_MAX_SIZE",
        default_value_t = 0,
        help = "Max request body size in bytes (0 to disable)"
    )]
    pub upload_max_size: u64,
    #[arg(
        long,
        env = "DROPSHELF_SHUTDOWN_GRACE_SECS",
        default_value_t = 0,
        help = "Seconds to drain in-flight requests on shutdown (0 exits immediately)"
    )]
    pub shutdown_grace_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_uploads_dir_and_port_8080() {
        let args = Args::try_parse_from(["dropshelf"]).expect("parse defaults");
        assert_eq!(args.storage_dir, "uploads");
        assert_eq!(args.port, 8080);
        assert_eq!(args.upload_max_size, 0);
        assert_eq!(args.shutdown_grace_secs, 0);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "dropshelf",
            "-s",
            "/var/lib/shelf",
            "-p",
            "9000",
            "--shutdown-grace-secs",
            "5",
        ])
        .expect("parse flags");
        assert_eq!(args.storage_dir, "/var/lib/shelf");
        assert_eq!(args.port, 9000);
        assert_eq!(args.shutdown_grace_secs, 5);
    }
}
