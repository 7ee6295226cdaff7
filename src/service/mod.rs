pub mod groups;
pub mod icons;
pub mod password;
pub mod site_settings;
