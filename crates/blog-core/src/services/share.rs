use crate::domain::Post;
use crate::forms::ValidShare;
use crate::ports::OutgoingEmail;

/// Build the recommendation mail for `post`.
///
/// The message has exactly one recipient, the address from the form.
pub fn compose_share_email(
    post: &Post,
    share: &ValidShare,
    post_url: &str,
    from: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        subject: format!("{} recommends you read {}", share.name, post.title),
        body: format!(
            "Read {} at {}\n\n{}'s comments: {}",
            post.title, post_url, share.name, share.comments
        ),
        from: from.to_string(),
        to: vec![share.to.clone()],
    }
}
