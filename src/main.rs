use anyhow::Context;
use clap::{Parser, Subcommand};
use s3kit::{Client, S3Config};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "s3kit")]
#[command(about = "Move records, files and directory trees in and out of S3", long_about = None)]
#[command(version)]
struct Args {
    /// Bucket name
    #[arg(short, long, env = "S3KIT_BUCKET")]
    bucket: Option<String>,

    /// Region (defaults to AWS_REGION or us-east-1)
    #[arg(long)]
    region: Option<String>,

    /// Endpoint URL for S3-compatible stores
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Use path-style addressing (needed by most S3-compatible stores)
    #[arg(long)]
    path_style: bool,

    /// Skip MD5 verification of downloaded files
    #[arg(long)]
    no_verify: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload every file below a directory under a key prefix
    UploadDir {
        /// Local directory to upload
        dir: PathBuf,
        /// Key prefix for the uploaded files
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    /// Download one object into a local directory
    Download {
        key: String,
        /// Destination directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Print an object as text
    Get { key: String },
    /// Upload a single local file to a key
    Put {
        key: String,
        file: PathBuf,
        /// Content type (defaults to the type inferred from the extension)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List keys under a prefix
    Ls {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Delete an object
    Rm { key: String },
    /// Exit with status 0 if the key exists, 1 otherwise
    Exists { key: String },
    /// Print a presigned GET URL
    Presign {
        key: String,
        /// Validity, e.g. "15m" or "1h 30m"
        #[arg(short, long, default_value = "1h", value_parser = humantime::parse_duration)]
        expires: Duration,
    },
}

fn spinner(message: String) -> indicatif::ProgressBar {
    if !atty::is(atty::Stream::Stderr) {
        return indicatif::ProgressBar::hidden();
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) =
        indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} | {elapsed_precise} elapsed")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("s3kit={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let mut config = S3Config::from_env();
    if let Some(bucket) = args.bucket {
        config.bucket = bucket;
    }
    if let Some(region) = args.region {
        config.region = region;
    }
    if args.endpoint_url.is_some() {
        config.endpoint_url = args.endpoint_url;
    }
    config.force_path_style |= args.path_style;
    config.verify_checksums = !args.no_verify;

    let client = Client::connect(&config)
        .await
        .context("failed to configure S3 client")?;

    match args.command {
        Command::UploadDir { dir, prefix } => {
            let pb = spinner(format!("📦 Uploading {}", dir.display()));
            let result = client.upload_directory(&prefix, &dir).await;
            pb.finish_and_clear();
            let keys = result.with_context(|| format!("upload of {} failed", dir.display()))?;
            info!("✅ Uploaded {} files", keys.len());
        }
        Command::Download { key, output } => {
            let pb = spinner(format!("⬇️  Downloading {}", key));
            let result = client.download_file(&key, &output).await;
            pb.finish_and_clear();
            let path = result.with_context(|| format!("download of {} failed", key))?;
            info!("✅ Saved {}", path.display());
        }
        Command::Get { key } => match client.get_string(&key).await? {
            Some(text) => print!("{}", text),
            None => anyhow::bail!("{} not found", key),
        },
        Command::Put {
            key,
            file,
            content_type,
        } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let content_type = content_type
                .or_else(|| client.content_types().for_path(&file).map(str::to_owned));
            client.write(&key, body, content_type.as_deref()).await?;
            info!("✅ Wrote {}", key);
        }
        Command::Ls { prefix } => {
            for object in client.list(&prefix).await? {
                println!("{:>12}  {}", object.size, object.key);
            }
        }
        Command::Rm { key } => {
            client.delete(&key).await?;
            info!("🗑️  Deleted {}", key);
        }
        Command::Exists { key } => {
            if !client.exists(&key).await? {
                std::process::exit(1);
            }
        }
        Command::Presign { key, expires } => {
            println!("{}", client.presigned_url(&key, expires).await?);
        }
    }

    Ok(())
}
