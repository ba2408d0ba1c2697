//! Center selection: picks the post that anchors the explore layout.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Post;

/// Picks one post uniformly at random, or `None` for an empty slice.
///
/// Not stable across calls. Callers that re-render the same result set must keep
/// the returned post instead of selecting again.
pub fn select_center<'a, R>(posts: &'a [Post], rng: &mut R) -> Option<&'a Post>
where
    R: Rng + ?Sized,
{
    posts.choose(rng)
}
