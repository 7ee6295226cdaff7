pub const DEFAULT_ICON: &str = "fas fa-globe";

/// URL fragment -> Font Awesome class. Checked in order; the first hit wins.
const ICON_RULES: &[(&str, &str)] = &[
    ("github.com", "fab fa-github"),
    ("youtube.com", "fab fa-youtube"),
    ("youtu.be", "fab fa-youtube"),
    ("twitter.com", "fab fa-twitter"),
    ("x.com", "fab fa-x-twitter"),
    ("facebook.com", "fab fa-facebook"),
    ("instagram.com", "fab fa-instagram"),
    ("linkedin.com", "fab fa-linkedin"),
    ("discord.com", "fab fa-discord"),
    ("discord.gg", "fab fa-discord"),
    ("reddit.com", "fab fa-reddit"),
    ("weixin.qq.com", "fab fa-weixin"),
    ("wechat.com", "fab fa-weixin"),
    ("weibo.com", "fab fa-weibo"),
    ("bilibili.com", "fab fa-bilibili"),
    ("stackoverflow.com", "fab fa-stack-overflow"),
    ("google.com", "fab fa-google"),
    ("telegram.org", "fab fa-telegram"),
    ("t.me", "fab fa-telegram"),
    ("docker.com", "fab fa-docker"),
    ("openai.com", "fas fa-robot"),
    ("chatgpt.com", "fas fa-robot"),
    ("wikipedia.org", "fab fa-wikipedia-w"),
    ("amazon", "fab fa-amazon"),
    ("apple.com", "fab fa-apple"),
    ("microsoft.com", "fab fa-microsoft"),
    ("zhihu.com", "fas fa-book-open"),
    ("douban.com", "fas fa-book"),
    ("taobao.com", "fas fa-shopping-bag"),
    ("jd.com", "fas fa-shopping-cart"),
];

/// Guess an icon from a plain substring match on the lowercased URL.
pub fn icon_for_url(url: &str) -> &'static str {
    let url = url.to_lowercase();
    ICON_RULES
        .iter()
        .find(|(fragment, _)| url.contains(fragment))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts_get_brand_icons() {
        assert_eq!(icon_for_url("https://GitHub.com/rust-lang"), "fab fa-github");
        assert_eq!(icon_for_url("https://youtu.be/abc"), "fab fa-youtube");
        assert_eq!(icon_for_url("https://www.amazon.co.jp"), "fab fa-amazon");
    }

    #[test]
    fn first_rule_wins_on_overlap() {
        // "x.com" is also a substring of "dropbox.com"-style hosts; order decides.
        assert_eq!(icon_for_url("https://github.com/x.com"), "fab fa-github");
        assert_eq!(icon_for_url("https://box.com"), "fab fa-x-twitter");
    }

    #[test]
    fn unknown_hosts_fall_back_to_globe() {
        assert_eq!(icon_for_url("https://example.org"), DEFAULT_ICON);
        assert_eq!(icon_for_url(""), DEFAULT_ICON);
    }
}
