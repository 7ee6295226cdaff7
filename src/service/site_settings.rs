use crate::db::SiteSettingEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// The only setting keys the site reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SiteSettingKey {
    ContactEmail,
    SiteTitle,
    SiteDescription,
    SiteBrand,
    SiteTutorialUrl,
    SiteYoutubeUrl,
    SiteGithubUrl,
}

impl SiteSettingKey {
    pub const ALL: [SiteSettingKey; 7] = [
        SiteSettingKey::ContactEmail,
        SiteSettingKey::SiteTitle,
        SiteSettingKey::SiteDescription,
        SiteSettingKey::SiteBrand,
        SiteSettingKey::SiteTutorialUrl,
        SiteSettingKey::SiteYoutubeUrl,
        SiteSettingKey::SiteGithubUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SiteSettingKey::ContactEmail => "contact_email",
            SiteSettingKey::SiteTitle => "site_title",
            SiteSettingKey::SiteDescription => "site_description",
            SiteSettingKey::SiteBrand => "site_brand",
            SiteSettingKey::SiteTutorialUrl => "site_tutorial_url",
            SiteSettingKey::SiteYoutubeUrl => "site_youtube_url",
            SiteSettingKey::SiteGithubUrl => "site_github_url",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub fn default_value(self) -> &'static str {
        match self {
            SiteSettingKey::ContactEmail => "contact@example.com",
            SiteSettingKey::SiteTitle => "数字花园",
            SiteSettingKey::SiteDescription => {
                "欢迎来到我的私人导航站。这里汇集了互联网上最优质的工具、资源与灵感。即使身处繁杂的信息洪流，也能保持高效与专注。"
            }
            SiteSettingKey::SiteBrand => "ForestNav",
            SiteSettingKey::SiteTutorialUrl => "#",
            SiteSettingKey::SiteYoutubeUrl => "https://youtube.com",
            SiteSettingKey::SiteGithubUrl => "https://github.com",
        }
    }
}

/// Effective site settings: every recognized key, stored value or default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SiteSettings(BTreeMap<&'static str, String>);

impl SiteSettings {
    /// `None` means the stored values could not be read; defaults are used throughout.
    /// Stored rows with unknown keys or null values are ignored.
    pub fn resolve(stored: Option<&[SiteSettingEntry]>) -> Self {
        let mut values: BTreeMap<&'static str, String> = SiteSettingKey::ALL
            .into_iter()
            .map(|k| (k.as_str(), k.default_value().to_string()))
            .collect();

        for entry in stored.unwrap_or_default() {
            let (Some(key), Some(value)) = (
                SiteSettingKey::parse(&entry.setting_key),
                entry.setting_value.as_ref(),
            ) else {
                continue;
            };
            values.insert(key.as_str(), value.clone());
        }
        Self(values)
    }

    pub fn get(&self, key: SiteSettingKey) -> &str {
        self.0
            .get(key.as_str())
            .map(String::as_str)
            .unwrap_or_else(|| key.default_value())
    }
}

/// Pick the submitted values worth writing: recognized keys with non-empty values.
pub fn collect_updates<'a>(
    submitted: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<(SiteSettingKey, &'a str)> {
    let mut updates: Vec<(SiteSettingKey, &'a str)> = submitted
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, value)| SiteSettingKey::parse(key).map(|k| (k, value)))
        .collect();
    updates.sort_by_key(|(k, _)| *k);
    updates.dedup_by_key(|(k, _)| *k);
    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: Option<&str>) -> SiteSettingEntry {
        SiteSettingEntry {
            setting_key: key.into(),
            setting_value: value.map(Into::into),
        }
    }

    #[test]
    fn defaults_fill_every_key() {
        let settings = SiteSettings::resolve(None);
        for key in SiteSettingKey::ALL {
            assert_eq!(settings.get(key), key.default_value());
        }
        assert_eq!(settings.get(SiteSettingKey::SiteBrand), "ForestNav");
    }

    #[test]
    fn stored_values_override_and_unknown_keys_are_ignored() {
        let stored = vec![
            entry("site_title", Some("My Links")),
            entry("site_brand", None),
            entry("favicon", Some("x.ico")),
        ];
        let settings = SiteSettings::resolve(Some(&stored));

        assert_eq!(settings.get(SiteSettingKey::SiteTitle), "My Links");
        assert_eq!(settings.get(SiteSettingKey::SiteBrand), "ForestNav");
        let json = serde_json::to_value(&settings).unwrap();
        assert!(json.get("favicon").is_none());
        assert_eq!(json["site_title"], "My Links");
    }

    #[test]
    fn updates_skip_empty_and_unrecognized_fields() {
        let updates = collect_updates([
            ("site_title", "New"),
            ("contact_email", ""),
            ("admin_password", "nope"),
            ("site_github_url", "https://github.com/me"),
        ]);
        assert_eq!(
            updates,
            vec![
                (SiteSettingKey::SiteTitle, "New"),
                (SiteSettingKey::SiteGithubUrl, "https://github.com/me"),
            ]
        );
    }
}
