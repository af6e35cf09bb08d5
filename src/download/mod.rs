//! Download submission: sources, form payloads, and the per-source state machine.

pub mod machine;
pub mod registry;

use serde::Serialize;
use std::fmt;

pub use machine::{DownloadMachine, DownloadPhase, PollOutcome, StatusKind, StatusMessage};
pub use registry::{is_known_model_type, ModelType, MODEL_TYPES};

/// Google Drive direct-download URL prefix for bare file ids
const GDRIVE_DOWNLOAD_PREFIX: &str = "https://drive.google.com/uc?export=download&id=";

/// External model source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DownloadSource {
    Civitai,
    HuggingFace,
    GoogleDrive,
}

impl DownloadSource {
    pub const ALL: [Self; 3] = [Self::Civitai, Self::HuggingFace, Self::GoogleDrive];

    /// Server endpoint the form is POSTed to
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Civitai => "/download/civitai",
            Self::HuggingFace => "/download/huggingface",
            Self::GoogleDrive => "/download/googledrive",
        }
    }

    /// Id of the trigger button in the host page
    #[must_use]
    pub const fn button_id(self) -> &'static str {
        match self {
            Self::Civitai => "civitaibutton",
            Self::HuggingFace => "huggingfacebutton",
            Self::GoogleDrive => "gdrivebutton",
        }
    }

    /// Id of the status line in the host page
    #[must_use]
    pub const fn status_id(self) -> &'static str {
        match self {
            Self::Civitai => "downloadStatus",
            Self::HuggingFace => "hfDownloadStatus",
            Self::GoogleDrive => "gdDownloadStatus",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Civitai => "Civitai",
            Self::HuggingFace => "HuggingFace",
            Self::GoogleDrive => "Google Drive",
        }
    }
}

impl fmt::Display for DownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Civitai form fields
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CivitaiForm {
    pub url: String,
    pub api_key: String,
    pub model_type: String,
}

/// HuggingFace form fields
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HuggingFaceForm {
    pub url: String,
    pub model_type: String,
}

/// Google Drive form fields
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GoogleDriveForm {
    pub url: String,
    pub model_type: String,
    pub filename: String,
}

impl GoogleDriveForm {
    /// Build the form, expanding a bare file id into a download URL
    #[must_use]
    pub fn new(url: &str, model_type: &str, filename: &str) -> Self {
        Self {
            url: normalize_gdrive_url(url),
            model_type: model_type.to_string(),
            filename: filename.to_string(),
        }
    }
}

/// Trim the input and turn anything not starting with `http` into a
/// drive.google.com download link
#[must_use]
pub fn normalize_gdrive_url(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.is_empty() && !trimmed.starts_with("http") {
        format!("{GDRIVE_DOWNLOAD_PREFIX}{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// A download submission; serializes to the body of its source's endpoint
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum DownloadRequest {
    Civitai(CivitaiForm),
    HuggingFace(HuggingFaceForm),
    GoogleDrive(GoogleDriveForm),
}

impl DownloadRequest {
    #[must_use]
    pub fn civitai(url: &str, api_key: &str, model_type: &str) -> Self {
        Self::Civitai(CivitaiForm {
            url: url.to_string(),
            api_key: api_key.to_string(),
            model_type: model_type.to_string(),
        })
    }

    #[must_use]
    pub fn huggingface(url: &str, model_type: &str) -> Self {
        Self::HuggingFace(HuggingFaceForm {
            url: url.to_string(),
            model_type: model_type.to_string(),
        })
    }

    #[must_use]
    pub fn google_drive(url: &str, model_type: &str, filename: &str) -> Self {
        Self::GoogleDrive(GoogleDriveForm::new(url, model_type, filename))
    }

    #[must_use]
    pub const fn source(&self) -> DownloadSource {
        match self {
            Self::Civitai(_) => DownloadSource::Civitai,
            Self::HuggingFace(_) => DownloadSource::HuggingFace,
            Self::GoogleDrive(_) => DownloadSource::GoogleDrive,
        }
    }

    #[must_use]
    pub fn model_type(&self) -> &str {
        match self {
            Self::Civitai(f) => &f.model_type,
            Self::HuggingFace(f) => &f.model_type,
            Self::GoogleDrive(f) => &f.model_type,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Civitai(f) => &f.url,
            Self::HuggingFace(f) => &f.url,
            Self::GoogleDrive(f) => &f.url,
        }
    }
}
