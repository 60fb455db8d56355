use derive_more::Display;
use serde::{Deserialize, Serialize};

pub const HOMEPAGE_HERO: &str = "homepage-hero";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub image: String,
    pub image_alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub open_in_new_tab: bool,
    pub placement: String,
    pub sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<BannerOverlay>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerOverlay {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub text_color: String,
    pub background_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BannerEvent {
    #[display("impression")]
    Impression,
    #[display("click")]
    Click,
}
