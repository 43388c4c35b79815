//! Case-insensitive title substring filter.
//!
//! # Invariants
//! - Empty query returns every post in its original order.
//! - Result is an order-preserving subsequence of the input.
//! - Filtering is idempotent for the same query.

use crate::model::post::Post;

/// Returns the posts whose title contains `query`, ignoring case.
///
/// The query is matched as a plain substring: it is not trimmed, tokenized
/// or fuzzy-matched.
pub fn filter_posts(posts: &[Post], query: &str) -> Vec<Post> {
    if query.is_empty() {
        return posts.to_vec();
    }

    let needle = query.to_lowercase();
    posts
        .iter()
        .filter(|post| post.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Returns whether a single title matches `query` under [`filter_posts`]
/// rules.
pub fn title_matches(title: &str, query: &str) -> bool {
    query.is_empty() || title.to_lowercase().contains(&query.to_lowercase())
}
