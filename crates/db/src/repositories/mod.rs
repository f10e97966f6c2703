//! Repositories: the stores behind the services.

mod comment;
mod feed;
mod follower;
mod invitation;
mod post;
mod user;

pub use comment::{CommentRepository, CommentWithAuthor};
pub use feed::{
    FeedPredicate, FeedRepository, FeedRow, SortDirection, compile_predicates, escape_like,
};
pub use follower::FollowerRepository;
pub use invitation::InvitationRepository;
pub use post::{NewPost, PostRepository};
pub use user::UserRepository;
