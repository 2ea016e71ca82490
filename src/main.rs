extern crate log;

mod cmd_init;
mod cmd_list;
mod config;
mod error;
mod listing;
mod projector;
mod s3;

use config::Config;
use s3::{ClientOptions, S3Client};

use cmd_init::cmd_init;
use cmd_list::{cmd_list, list_params};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::process::exit;

#[derive(Parser)]
#[command(author, about, version, long_about=None)]
pub struct Cli {
    #[arg(short = 'p', long = "profile", global = true)]
    profile: Option<String>,

    #[arg(long = "region", global = true)]
    region: Option<String>,

    #[arg(long = "endpoint-url", global = true)]
    endpoint_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Init a new connection profile")]
    Init { name: Option<String> },
    #[command(about = "List object keys under a prefix")]
    List {
        #[arg(short = 'b', long = "bucket")]
        bucket: Option<String>,

        #[arg(short = 'x', long = "prefix")]
        prefix: Option<String>,

        #[arg(short='r', long="recursive", action=ArgAction::Set, default_value_t=true)]
        recursive: bool,

        #[arg(short = 'm', long = "max-keys",
              value_parser = clap::value_parser!(i32).range(1..=1000))]
        max_keys: Option<i32>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        log::error!("{:#}", err);
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { name } => {
            cmd_init(&init_name(name, cli.profile))
        }
        Commands::List {
            bucket,
            prefix,
            recursive,
            max_keys,
        } => {
            let cfg = match &cli.profile {
                Some(_) => Some(Config::load()?),
                None => None,
            };
            let profile = match (&cfg, &cli.profile) {
                (Some(cfg), Some(name)) => {
                    Some(cfg.profile(name).with_context(|| format!("unknown profile {}", name))?)
                }
                _ => None,
            };

            let params = list_params(bucket, prefix, recursive, profile);
            params.check()?;

            let cl = S3Client::new(ClientOptions {
                profile,
                region: cli.region,
                endpoint_url: cli.endpoint_url,
                max_keys,
            })
            .await;

            cmd_list(&cl, &params).await
        }
    }
}

/// The profile `init` creates: its own argument, then the global `--profile`.
fn init_name(name: Option<String>, profile: Option<String>) -> String {
    name.or(profile).unwrap_or_else(|| "default".to_string())
}
