use crate::directory::{ChannelRecord, UserRecord};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static ANGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>\n]+)>").expect("valid regex"));
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\n?").expect("valid regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}([0-9]+)\u{E001}").expect("valid regex"));
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| emphasis_regex('*'));
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| emphasis_regex('_'));
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| emphasis_regex('~'));

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Matches `<m>text<m>` where the opening marker is not glued to a word and
/// the text neither starts nor ends with whitespace
fn emphasis_regex(marker: char) -> Regex {
    let m = regex::escape(&marker.to_string());
    Regex::new(&format!(
        r"(^|[^\w{m}]){m}([^\s{m}](?:[^{m}\n]*[^\s{m}])?){m}"
    ))
    .expect("valid regex")
}

/// Strips Slack mrkdwn syntax, resolving user and channel references
///
/// Slack sends `<@U123>` for mentions, `<#C123|name>` for channel links,
/// `<!here>` for broadcasts and `<url|label>` for links, with `<`, `>` and
/// `&` HTML-escaped. The result is plain, human-readable text.
pub struct FormatRemover {
    users: HashMap<String, String>,
    channels: HashMap<String, String>,
}

impl FormatRemover {
    pub fn new(users: &[UserRecord], channels: &[ChannelRecord]) -> Self {
        Self {
            users: users
                .iter()
                .map(|u| (u.id.clone(), u.name.clone()))
                .collect(),
            channels: channels
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
        }
    }

    pub fn remove(&self, text: &str) -> String {
        // Angle-bracket tokens are resolved up front and parked behind
        // placeholders so URLs keep their underscores and asterisks while
        // emphasis wrapping a link or mention is still stripped
        let mut resolved = Vec::new();
        let masked = ANGLE_RE.replace_all(text, |caps: &Captures| {
            resolved.push(self.resolve_token(&caps[1]));
            format!("{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}", resolved.len() - 1)
        });

        let stripped = strip_markup(&masked);

        PLACEHOLDER_RE
            .replace_all(&stripped, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| resolved.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve_token(&self, token: &str) -> String {
        let (target, label) = match token.split_once('|') {
            Some((target, label)) => (target, Some(unescape(label))),
            None => (token, None),
        };

        if let Some(id) = target.strip_prefix('@') {
            let name = self
                .users
                .get(id)
                .cloned()
                .or(label)
                .unwrap_or_else(|| id.to_string());
            return format!("@{}", name.trim_start_matches('@'));
        }

        if let Some(id) = target.strip_prefix('#') {
            let name = self
                .channels
                .get(id)
                .cloned()
                .or(label)
                .unwrap_or_else(|| id.to_string());
            return format!("#{}", name.trim_start_matches('#'));
        }

        if let Some(command) = target.strip_prefix('!') {
            return match command.split_once('^') {
                Some(("subteam", id)) => label.unwrap_or_else(|| format!("@{}", id)),
                Some((_, _)) => label.unwrap_or_default(),
                None => match command {
                    "here" | "channel" | "everyone" => format!("@{}", command),
                    other => label.unwrap_or_else(|| format!("@{}", other)),
                },
            };
        }

        label.unwrap_or_else(|| unescape(target.strip_prefix("mailto:").unwrap_or(target)))
    }
}

fn strip_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let result = FENCE_RE.replace_all(text, "");
    let result = INLINE_CODE_RE.replace_all(&result, "$1");
    let result = strip_emphasis(&result, &BOLD_RE);
    let result = strip_emphasis(&result, &ITALIC_RE);
    let result = strip_emphasis(&result, &STRIKE_RE);

    unescape(&result)
}

fn strip_emphasis(text: &str, re: &Regex) -> String {
    re.replace_all(text, |caps: &Captures| {
        let end = caps.get(0).map(|m| m.end()).unwrap_or(text.len());
        // Closing marker glued to a word: not emphasis (e.g. `_init_x`)
        if text[end..].chars().next().is_some_and(char::is_alphanumeric) {
            return caps[0].to_string();
        }
        format!("{}{}", &caps[1], &caps[2])
    })
    .into_owned()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testing::{channel, user};

    fn remover() -> FormatRemover {
        FormatRemover::new(
            &[user("U1", "alice"), user("U2", "bob")],
            &[channel("C1", "general")],
        )
    }

    #[test]
    fn test_mentions_resolved_from_directory() {
        let out = remover().remove("<@U1> can you check <#C1>? cc <@U2|robert>");
        assert_eq!(out, "@alice can you check #general? cc @bob");
    }

    #[test]
    fn test_unknown_references_fall_back() {
        let r = remover();
        assert_eq!(r.remove("<@U9|carol>"), "@carol");
        assert_eq!(r.remove("<@U9>"), "@U9");
        assert_eq!(r.remove("<#C9|ops>"), "#ops");
        assert_eq!(r.remove("<#C9>"), "#C9");
    }

    #[test]
    fn test_special_commands() {
        let r = remover();
        assert_eq!(r.remove("<!here> deploy done"), "@here deploy done");
        assert_eq!(r.remove("<!channel|channel>"), "@channel");
        assert_eq!(r.remove("ping <!subteam^S1|@devs>"), "ping @devs");
        assert_eq!(
            r.remove("<!date^1392734382^{date}|Feb 18, 2014>"),
            "Feb 18, 2014"
        );
    }

    #[test]
    fn test_links() {
        let r = remover();
        assert_eq!(r.remove("see <https://example.com|the site>"), "see the site");
        assert_eq!(
            r.remove("<https://example.com/a_b_c?x=*y*>"),
            "https://example.com/a_b_c?x=*y*"
        );
        assert_eq!(r.remove("<mailto:a@b.com|a@b.com>"), "a@b.com");
        assert_eq!(r.remove("<mailto:a@b.com>"), "a@b.com");
    }

    #[test]
    fn test_emphasis_and_code_removed() {
        let out = remover().remove("*bold* _italic_ ~gone~ `code` ```let x = 1;```");
        assert_eq!(out, "bold italic gone code let x = 1;");

        assert_eq!(remover().remove("*a* *b*"), "a b");
    }

    #[test]
    fn test_emphasis_around_links_and_mentions() {
        let r = remover();
        assert_eq!(r.remove("*see <https://x.io|the docs>*"), "see the docs");
        assert_eq!(r.remove("_ping <@U1>_ now"), "ping @alice now");
        assert_eq!(
            r.remove("~old: <https://a.io/x_y_z>~ `<#C1>`"),
            "old: https://a.io/x_y_z #general"
        );
    }

    #[test]
    fn test_non_emphasis_kept() {
        let r = remover();
        assert_eq!(r.remove("snake_case_name"), "snake_case_name");
        assert_eq!(r.remove("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(r.remove("_private_field"), "_private_field");
    }

    #[test]
    fn test_entities_unescaped_once() {
        assert_eq!(remover().remove("&lt;tag&gt; &amp;lt;"), "<tag> &lt;");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Nothing special here, just words: 42!";
        assert_eq!(remover().remove(text), text);
    }
}
