//! Use-cases - the blog's operations expressed over the ports.

mod blog;
mod share;

pub use blog::{
    BlogService, BlogSettings, PostDetail, PostListing, RankedPost, Repositories, SharedPost,
};
pub use share::compose_share_email;
