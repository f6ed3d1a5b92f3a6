//! HTML pages
//!
//! Plain string formatting; every value that came from GitHub or the
//! query string is escaped before it is interpolated.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::auth::CachedUser;
use crate::github::{ProviderMessage, ProviderReply, Repository};

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = encode_text(title),
    )
}

/// GET /
pub fn home_page(error: Option<&str>) -> String {
    let notice = match error {
        Some("invalid_state") => {
            "<p class=\"error\">Login failed: the request could not be verified. Please try again.</p>\n"
                .to_string()
        }
        Some("bad_token") => {
            "<p class=\"error\">Login failed: GitHub did not issue an access token.</p>\n"
                .to_string()
        }
        Some(other) => format!("<p class=\"error\">Error: {}</p>\n", encode_text(other)),
        None => String::new(),
    };

    layout(
        "GitHub OAuth Demo",
        &format!(
            "{notice}<h1>GitHub OAuth Demo</h1>\n<p><a href=\"/github\">Continue to GitHub</a></p>"
        ),
    )
}

/// GET /notfound
pub fn not_found_page() -> String {
    layout(
        "Not Found",
        "<h1>Not Found</h1>\n<p><a href=\"/\">Back to the homepage</a></p>",
    )
}

/// Entry route without a token
pub fn logged_out_page() -> String {
    layout(
        "GitHub OAuth Demo",
        "<h3>Logged Out</h3>\n<p><a href=\"/github?action=login\">Log in with GitHub</a></p>",
    )
}

/// Entry route with a token
pub fn logged_in_page(user: &CachedUser) -> String {
    let display_name = user
        .name
        .as_deref()
        .map(|name| format!(" ({})", encode_text(name)))
        .unwrap_or_default();

    layout(
        "GitHub OAuth Demo",
        &format!(
            "<h3>Logged In</h3>\n<p>Welcome, {login}{display_name}</p>\n<p><a href=\"/github?action=repos\">View Repos</a></p>\n<p><a href=\"/github?action=logout\">Log Out</a></p>",
            login = encode_text(&user.login),
        ),
    )
}

/// `action=repos`
///
/// `login` is the cached user, if GitHub told us who that is.
pub fn repos_page(login: Option<&str>, repos: &ProviderReply<Vec<Repository>>) -> String {
    let heading = match login {
        Some(login) => format!("<h3>Repos for {}</h3>", encode_text(login)),
        None => "<h3>Repos</h3>".to_string(),
    };

    let listing = match repos {
        ProviderReply::Ok(repos) => {
            let items = repos.iter().map(repo_item).collect::<Vec<_>>().join("\n");
            format!("<ul>\n{items}\n</ul>")
        }
        ProviderReply::Rejected(message) => provider_notice(message),
    };

    layout(
        "GitHub OAuth Demo",
        &format!("{heading}\n{listing}\n<p><a href=\"/github\">Back</a></p>"),
    )
}

fn repo_item(repo: &Repository) -> String {
    let label = encode_text(repo.full_name.as_deref().unwrap_or(&repo.name));
    let link = match repo.html_url.as_deref() {
        Some(url) => format!(
            "<a href=\"{}\">{label}</a>",
            encode_double_quoted_attribute(url)
        ),
        None => label.into_owned(),
    };
    let badge = if repo.private { " <em>(private)</em>" } else { "" };
    let description = repo
        .description
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(|text| format!(" - {}", encode_text(text)))
        .unwrap_or_default();

    format!("<li>{link}{badge}{description}</li>")
}

/// Entry route when GitHub refused the profile request
pub fn provider_error_page(message: &ProviderMessage) -> String {
    layout(
        "GitHub OAuth Demo",
        &format!(
            "<h3>GitHub Error</h3>\n{}\n<p><a href=\"/github?action=logout\">Log Out</a></p>",
            provider_notice(message)
        ),
    )
}

fn provider_notice(message: &ProviderMessage) -> String {
    format!(
        "<p class=\"error\">GitHub responded: {}</p>",
        encode_text(&message.message)
    )
}
