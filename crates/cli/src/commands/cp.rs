//! cp command - Copy files or directories between two storage endpoints
//!
//! Parses both URIs, connects the backend clients (one client when the
//! schemes match), and hands the pair to the transfer engine.

use clap::Args;

use ferry_core::{CopyOptions, Uri};
use ferry_s3::S3Options;

use crate::exit_code::ExitCode;
use crate::output::Formatter;
use crate::registry;

/// Copy files or directories between two storage endpoints
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Path to copy from. Example: k8s://<namespace>/<pod>/<container>/path/to/copyfrom
    #[arg(long)]
    pub src: String,

    /// Path to copy to. Example: s3://<bucketName>/path/to/copyto
    #[arg(long)]
    pub dst: String,

    /// Number of files to copy in parallel; 0 copies everything at once
    #[arg(short = 'p', long, default_value_t = 1)]
    pub parallel: usize,

    /// In-memory buffer size (MiB) to use per file copy
    #[arg(short = 'b', long = "buffer-size", default_value_t = 6.75)]
    pub buffer_size: f64,

    /// Size in bytes of each part for multipart uploads to S3
    #[arg(short = 's', long = "s3-part-size", default_value_t = 128 * 1024 * 1024)]
    pub s3_part_size: u64,

    /// Maximum number of parts for multipart uploads to S3
    #[arg(short = 'm', long = "s3-max-upload-parts", default_value_t = 10_000)]
    pub s3_max_upload_parts: usize,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Execute the cp command
pub async fn execute(args: CpArgs) -> ExitCode {
    let formatter = Formatter::new();

    let src = match Uri::parse(&args.src) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&format!("invalid --src: {e}"));
            return ExitCode::UsageError;
        }
    };
    let dst = match Uri::parse(&args.dst) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&format!("invalid --dst: {e}"));
            return ExitCode::UsageError;
        }
    };

    let s3_options = S3Options {
        part_size: args.s3_part_size,
        max_upload_parts: args.s3_max_upload_parts,
    };
    let (src_client, dst_client) = match registry::connect_pair(&src, &dst, &s3_options).await {
        Ok(clients) => clients,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let options = CopyOptions {
        parallel: args.parallel,
        buffer_size_mib: args.buffer_size,
    };
    match ferry_core::copy(src_client, dst_client, &src, &dst, &options).await {
        Ok(copied) => {
            formatter.success(&format!("copied {copied} file(s): {src} -> {dst}"));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CpArgs,
    }

    #[test]
    fn test_cp_args_defaults() {
        let cli = TestCli::parse_from([
            "ferry",
            "--src",
            "k8s://ns/pod/c/data",
            "--dst",
            "s3://bkt",
        ]);
        assert_eq!(cli.args.parallel, 1);
        assert_eq!(cli.args.buffer_size, 6.75);
        assert_eq!(cli.args.s3_part_size, 128 * 1024 * 1024);
        assert_eq!(cli.args.s3_max_upload_parts, 10_000);
        assert!(!cli.args.verbose);
    }

    #[test]
    fn test_cp_args_short_flags() {
        let cli = TestCli::parse_from([
            "ferry",
            "--src",
            "s3://bkt1/a",
            "--dst",
            "s3://bkt2/b",
            "-p",
            "4",
            "-b",
            "1.5",
            "-s",
            "67108864",
            "-m",
            "500",
            "-v",
        ]);
        assert_eq!(cli.args.parallel, 4);
        assert_eq!(cli.args.buffer_size, 1.5);
        assert_eq!(cli.args.s3_part_size, 64 * 1024 * 1024);
        assert_eq!(cli.args.s3_max_upload_parts, 500);
        assert!(cli.args.verbose);
    }

    #[test]
    fn test_cp_args_require_src_and_dst() {
        assert!(TestCli::try_parse_from(["ferry", "--src", "s3://bkt"]).is_err());
        assert!(TestCli::try_parse_from(["ferry", "--dst", "s3://bkt"]).is_err());
    }
}
