//! Development data seeder.

use std::collections::BTreeSet;

use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use social_common::AppResult;
use social_db::{
    bounded::db_err,
    entities::{Follower, comment, follower, post, user},
};

use super::password::hash_password;
use super::post::normalize_tags;

const USERNAMES: &[&str] = &[
    "AlphaWolf", "BetaBear", "CyberNinja", "DarkPhoenix", "EchoFalcon", "FrostByte",
    "GhostRider", "HyperTiger", "IronClaw", "JetStream", "KnightHawk", "LunarFox",
    "MatrixX", "NeonViper", "OmegaRogue", "PixelPioneer", "QuantumQuake", "RogueSpecter",
    "ShadowFang", "ThunderBolt", "UltraVortex", "ViperStrike", "WarpRunner", "XenonBlast",
    "YellowJacket", "ZetaStorm",
];

const POSTS: &[(&str, &str, &[&str])] = &[
    ("Morning Motivation", "Start your day with a positive mindset!", &["motivation", "morning", "self-improvement"]),
    ("Tech Trends", "AI is evolving faster than ever.", &["technology", "ai", "trends"]),
    ("Workout Tips", "Stay hydrated and stretch before exercise.", &["fitness", "health", "workout"]),
    ("Book Recommendations", "Check out this thriller novel!", &["books", "reading", "thriller"]),
    ("Coding Challenge", "Solve this algorithm problem today.", &["programming", "coding", "challenge"]),
    ("Healthy Eating", "Try adding more greens to your diet.", &["health", "nutrition", "food"]),
    ("Movie Night", "Rewatching an old classic tonight!", &["movies", "entertainment", "classic"]),
    ("Travel Goals", "Dreaming of my next destination.", &["travel", "adventure", "dream"]),
    ("Music Vibes", "This playlist is getting me through the day.", &["music", "playlist", "vibes"]),
    ("Game On", "Who's up for some online matches?", &["gaming", "multiplayer", "fun"]),
    ("Coffee Break", "Nothing beats a fresh cup in the morning.", &["coffee", "morning", "energy"]),
    ("Productivity Hacks", "Try the Pomodoro technique for focus.", &["productivity", "focus"]),
    ("Hiking Adventures", "Exploring a new trail this weekend!", &["hiking", "outdoors", "nature"]),
    ("Music Discovery", "Found an underrated band today!", &["music", "discovery", "bands"]),
    ("Space Exploration", "Mars mission update is exciting!", &["space", "science", "exploration"]),
];

const COMMENTS: &[&str] = &[
    "Great post!", "This is so helpful, thanks!", "I totally agree!", "Well said!",
    "Interesting perspective!", "Can you elaborate on that?", "Love this!",
    "Thanks for sharing!", "I learned something new today.", "This made my day!",
    "Brilliant insight!", "So true!", "I never thought of it that way!", "Amazing read!",
    "Such a good reminder.", "Very insightful!", "You nailed it!", "Mind blown!",
    "Where can I learn more about this?", "Totally bookmarking this.",
];

/// How much data to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    /// Upper bound on accounts each user follows.
    pub max_follows_per_user: usize,
    /// Fixed RNG seed for reproducible data.
    pub rng_seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users: 100,
            posts: 200,
            comments: 500,
            max_follows_per_user: 10,
            rng_seed: None,
        }
    }
}

/// Counts of what was written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
}

/// Generated rows, referring to users and posts by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: Vec<(String, String)>,
    /// `(author index, fixture index)`
    pub posts: Vec<(usize, usize)>,
    /// `(post index, author index, fixture index)`
    pub comments: Vec<(usize, usize, usize)>,
    /// `(followed index, follower index)`
    pub follows: BTreeSet<(usize, usize)>,
}

impl SeedPlan {
    /// Generate a plan from `options`.
    #[must_use]
    pub fn generate(options: &SeedOptions) -> Self {
        let mut rng = options
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let users: Vec<_> = (0..options.users)
            .map(|i| {
                let base = USERNAMES[i % USERNAMES.len()];
                let username = format!("{base}{i}");
                let email = format!("{}@example.com", username.to_lowercase());
                (username, email)
            })
            .collect();

        if users.is_empty() {
            return Self {
                users,
                posts: Vec::new(),
                comments: Vec::new(),
                follows: BTreeSet::new(),
            };
        }

        let posts: Vec<_> = (0..options.posts)
            .map(|_| (rng.gen_range(0..users.len()), rng.gen_range(0..POSTS.len())))
            .collect();

        let comments = if posts.is_empty() {
            Vec::new()
        } else {
            (0..options.comments)
                .map(|_| {
                    (
                        rng.gen_range(0..posts.len()),
                        rng.gen_range(0..users.len()),
                        rng.gen_range(0..COMMENTS.len()),
                    )
                })
                .collect()
        };

        let indices: Vec<usize> = (0..users.len()).collect();
        let mut follows = BTreeSet::new();
        for follower in 0..users.len() {
            let count = rng.gen_range(0..=options.max_follows_per_user.min(users.len() - 1));
            for &followed in indices
                .iter()
                .filter(|&&u| u != follower)
                .collect::<Vec<_>>()
                .choose_multiple(&mut rng, count)
            {
                follows.insert((*followed, follower));
            }
        }

        Self {
            users,
            posts,
            comments,
            follows,
        }
    }
}

/// Write a generated data set in a single transaction.
pub async fn seed(db: &DatabaseConnection, options: &SeedOptions) -> AppResult<SeedReport> {
    let plan = SeedPlan::generate(options);
    let password_hash = hash_password("password")?;
    let txn = db.begin().await.map_err(db_err)?;

    let mut user_ids = Vec::with_capacity(plan.users.len());
    for (username, email) in &plan.users {
        let model = user::ActiveModel {
            username: Set(username.clone()),
            email: Set(email.clone()),
            password_hash: Set(password_hash.clone()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        user_ids.push(model.insert(&txn).await.map_err(db_err)?.id);
    }

    let mut post_ids = Vec::with_capacity(plan.posts.len());
    for &(author, fixture) in &plan.posts {
        let (title, content, tags) = POSTS[fixture];
        let now: DateTimeWithTimeZone = Utc::now().into();
        let model = post::ActiveModel {
            user_id: Set(user_ids[author]),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            tags: Set(normalize_tags(tags)),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        post_ids.push(model.insert(&txn).await.map_err(db_err)?.id);
    }

    for &(post_idx, author, fixture) in &plan.comments {
        let model = comment::ActiveModel {
            post_id: Set(post_ids[post_idx]),
            user_id: Set(user_ids[author]),
            content: Set(COMMENTS[fixture].to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        model.insert(&txn).await.map_err(db_err)?;
    }

    let edges: Vec<_> = plan
        .follows
        .iter()
        .map(|&(followed, follower)| follower::ActiveModel {
            user_id: Set(user_ids[followed]),
            follower_id: Set(user_ids[follower]),
            created_at: Set(Utc::now().into()),
        })
        .collect();
    if !edges.is_empty() {
        Follower::insert_many(edges)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;
    }

    txn.commit().await.map_err(db_err)?;

    let report = SeedReport {
        users: user_ids.len(),
        posts: post_ids.len(),
        comments: plan.comments.len(),
        follows: plan.follows.len(),
    };
    tracing::info!(
        users = report.users,
        posts = report.posts,
        comments = report.comments,
        follows = report.follows,
        "Database seeded"
    );
    Ok(report)
}
