//! HTML rendering
//!
//! The page is a single template with three slots. Everything that originates
//! outside the program (titles, authors, generated text, error messages) is
//! escaped before it is placed into a slot.

use axum::http::StatusCode;
use libredditor::types::DEFAULT_LIMIT;
use libredditor::{FetchRequest, Post};

const TEMPLATE: &str = include_str!("../templates/index.html");

const NO_ENRICHMENT: &str = "No enrichment available";

/// Render the index page, optionally with the result of a fetch
pub fn index(request: Option<&FetchRequest>, posts: Option<&[Post]>) -> String {
    let subreddit = request.map(FetchRequest::channel).unwrap_or("");
    let limit = request.map(FetchRequest::limit).unwrap_or(DEFAULT_LIMIT);

    let content = match posts {
        None => String::new(),
        Some([]) => format!(
            "<p class=\"empty\">No posts found for r/{}.</p>",
            escape_html(subreddit)
        ),
        Some(posts) => post_list(posts),
    };

    fill(subreddit, limit, &content)
}

/// Render the index page with an error panel instead of results
pub fn error_page(status: StatusCode, message: &str) -> String {
    let content = format!(
        "<div class=\"error\"><h2>{} {}</h2><p>{}</p></div>",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error"),
        escape_html(message)
    );

    fill("", DEFAULT_LIMIT, &content)
}

fn post_list(posts: &[Post]) -> String {
    let mut html = String::from("<ol class=\"posts\">\n");

    for post in posts {
        let enrichment = match post.enrichment() {
            Some(text) => format!("<p class=\"enrichment\">{}</p>", escape_html(text)),
            None => format!("<p class=\"enrichment missing\">{}</p>", NO_ENRICHMENT),
        };

        html.push_str(&format!(
            "<li class=\"post\">\n<h2>{}</h2>\n<p class=\"meta\">by u/{} &middot; {} points</p>\n{}\n</li>\n",
            escape_html(post.title()),
            escape_html(post.author()),
            post.score(),
            enrichment
        ));
    }

    html.push_str("</ol>");
    html
}

// Content goes last so text inside it is never treated as a slot
fn fill(subreddit: &str, limit: u32, content: &str) -> String {
    TEMPLATE
        .replace("{{subreddit}}", &escape_html(subreddit))
        .replace("{{limit}}", &limit.to_string())
        .replace("{{content}}", content)
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_index_without_posts_has_form_only() {
        let html = index(None, None);
        assert!(html.contains("action=\"/fetch_posts/\""));
        assert!(html.contains("value=\"5\""));
        assert!(!html.contains("class=\"posts\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_index_renders_posts() {
        let mut enriched = Post::new("Rust <3", "ferris", 42);
        enriched.set_enrichment("Crabs & friends".to_string());
        let bare = Post::new("Second", "[deleted]", -3);
        let request = FetchRequest::new("rust", 2).unwrap();

        let posts = vec![enriched, bare];
        let html = index(Some(&request), Some(posts.as_slice()));

        assert!(html.contains("<h2>Rust &lt;3</h2>"));
        assert!(html.contains("by u/ferris &middot; 42 points"));
        assert!(html.contains("Crabs &amp; friends"));
        assert!(html.contains("by u/[deleted] &middot; -3 points"));
        assert!(html.contains(NO_ENRICHMENT));
        assert!(html.contains("value=\"rust\""));
        assert!(html.contains("value=\"2\""));
    }

    #[test]
    fn test_index_empty_result() {
        let request = FetchRequest::new("nosuchsub", 5).unwrap();
        let html = index(Some(&request), Some(Vec::new().as_slice()));
        assert!(html.contains("No posts found for r/nosuchsub."));
    }

    #[test]
    fn test_error_page() {
        let html = error_page(StatusCode::BAD_REQUEST, "n must be a number, got '<b>'");
        assert!(html.contains("400 Bad Request"));
        assert!(html.contains("got &#x27;&lt;b&gt;&#x27;"));
    }
}
