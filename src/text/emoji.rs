use emojis::{Emoji, SkinTone};
use regex::Regex;
use std::sync::LazyLock;

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_+\-]+):").expect("valid regex"));
static SKIN_TONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:skin-tone-([2-6]):").expect("valid regex"));

/// Shortcodes Slack knows that are missing from the gemoji set
const SLACK_ALIASES: &[(&str, &str)] = &[("simple_smile", "slightly_smiling_face")];

/// Replace emoji shortcodes like `:smile:` with the emoji itself
///
/// Unknown shortcodes are left untouched and scanning resumes after their
/// closing colon, so `10:30:smile:` stays as written. Slack's
/// `:skin-tone-N:` suffix is folded into the preceding emoji when it
/// supports skin tones.
pub fn replace_emojis(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(caps) = SHORTCODE_RE.captures_at(text, search) {
        let Some(whole) = caps.get(0) else { break };

        match lookup(&caps[1]) {
            Some(emoji) => {
                let mut end = whole.end();
                let mut emoji = emoji;

                if let Some(tone) = SKIN_TONE_RE.captures(&text[end..]) {
                    let toned = skin_tone(&tone[1]).and_then(move |t| emoji.with_skin_tone(t));
                    if let Some(toned) = toned {
                        emoji = toned;
                        end += tone[0].len();
                    }
                }

                result.push_str(&text[copied..whole.start()]);
                result.push_str(emoji.as_str());
                copied = end;
                search = end;
            }
            None => search = whole.end(),
        }
    }

    result.push_str(&text[copied..]);
    result
}

fn lookup(shortcode: &str) -> Option<&'static Emoji> {
    let shortcode = SLACK_ALIASES
        .iter()
        .find(|(alias, _)| *alias == shortcode)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(shortcode);

    emojis::get_by_shortcode(shortcode)
        .or_else(|| emojis::get_by_shortcode(&shortcode.to_lowercase()))
}

fn skin_tone(level: &str) -> Option<SkinTone> {
    match level {
        "2" => Some(SkinTone::Light),
        "3" => Some(SkinTone::MediumLight),
        "4" => Some(SkinTone::Medium),
        "5" => Some(SkinTone::MediumDark),
        "6" => Some(SkinTone::Dark),
        _ => None,
    }
}
