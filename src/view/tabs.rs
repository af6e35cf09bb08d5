use crate::download::DownloadSource;
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Downloader tab
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    #[serde(rename = "civitai")]
    Civitai,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "gdrive")]
    GoogleDrive,
}

impl Tab {
    pub const ALL: [Self; 3] = [Self::Civitai, Self::HuggingFace, Self::GoogleDrive];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Civitai => "civitai",
            Self::HuggingFace => "huggingface",
            Self::GoogleDrive => "gdrive",
        }
    }

    /// Id of the tab button
    #[must_use]
    pub fn tab_id(self) -> String {
        format!("{}-tab", self.name())
    }

    /// Id of the downloader panel
    #[must_use]
    pub fn panel_id(self) -> String {
        format!("{}-downloader", self.name())
    }

    #[must_use]
    pub const fn source(self) -> DownloadSource {
        match self {
            Self::Civitai => DownloadSource::Civitai,
            Self::HuggingFace => DownloadSource::HuggingFace,
            Self::GoogleDrive => DownloadSource::GoogleDrive,
        }
    }
}

impl From<DownloadSource> for Tab {
    fn from(source: DownloadSource) -> Self {
        match source {
            DownloadSource::Civitai => Self::Civitai,
            DownloadSource::HuggingFace => Self::HuggingFace,
            DownloadSource::GoogleDrive => Self::GoogleDrive,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tab {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| PanelError::UnknownTab(s.to_string()))
    }
}

/// Tab strip; exactly one tab is active
#[derive(Debug, Clone)]
pub struct TabBar {
    active: Tab,
}

impl TabBar {
    #[must_use]
    pub const fn new(initial: Tab) -> Self {
        Self { active: initial }
    }

    #[must_use]
    pub const fn active(&self) -> Tab {
        self.active
    }

    /// Activate the tab called `name`; unknown names leave the bar as is
    pub fn switch(&mut self, name: &str) -> Result<Tab> {
        let tab: Tab = name.parse()?;
        self.activate(tab);
        Ok(tab)
    }

    pub fn activate(&mut self, tab: Tab) {
        self.active = tab;
    }

    /// Every tab with its active flag, in display order
    #[must_use]
    pub fn tabs(&self) -> Vec<(Tab, bool)> {
        Tab::ALL.into_iter().map(|t| (t, t == self.active)).collect()
    }
}
