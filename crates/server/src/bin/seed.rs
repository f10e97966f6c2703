//! Populate a database with sample users, posts, comments and follows.

use clap::Parser;
use social_common::Config;
use social_core::{SeedOptions, seed};
use tracing::info;

/// `social-seed` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "social-seed",
    about = "Seed the database with sample users, posts, comments and follows",
    version
)]
struct CliArgs {
    /// Number of users to create.
    #[arg(long, default_value_t = 100)]
    users: usize,
    /// Number of posts to create.
    #[arg(long, default_value_t = 200)]
    posts: usize,
    /// Number of comments to create.
    #[arg(long, default_value_t = 500)]
    comments: usize,
    /// Upper bound on accounts each user follows.
    #[arg(long = "max-follows", default_value_t = 10)]
    max_follows_per_user: usize,
    /// Fix the random generator for reproducible data.
    #[arg(long = "rng-seed", value_name = "n")]
    rng_seed: Option<u64>,
    /// Skip running migrations first.
    #[arg(long)]
    no_migrate: bool,
}

impl From<&CliArgs> for SeedOptions {
    fn from(args: &CliArgs) -> Self {
        Self {
            users: args.users,
            posts: args.posts,
            comments: args.comments,
            max_follows_per_user: args.max_follows_per_user,
            rng_seed: args.rng_seed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = Config::load()?;
    social_server::init_tracing(&config.logging, "social=info");

    let db = social_db::init(&config).await?;
    if !args.no_migrate {
        social_db::migrate(&db).await?;
    }

    let report = seed(&db, &SeedOptions::from(&args)).await?;
    info!(
        users = report.users,
        posts = report.posts,
        comments = report.comments,
        follows = report.follows,
        "Seeding complete"
    );
    Ok(())
}
