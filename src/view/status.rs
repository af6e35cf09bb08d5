use crate::api::ModelMap;

pub const NO_CUSTOM_NODES: &str = "No custom nodes detected yet.";
pub const NO_MODELS: &str = "No models found.";

/// Custom node list as shown in the status panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomNodesView {
    /// Bullet items; the placeholder alone when there are no nodes
    pub items: Vec<String>,
    pub count: usize,
}

impl CustomNodesView {
    #[must_use]
    pub fn from_nodes(nodes: Option<&[String]>) -> Self {
        match nodes {
            Some(nodes) if !nodes.is_empty() => Self {
                items: nodes.to_vec(),
                count: nodes.len(),
            },
            _ => Self {
                items: vec![NO_CUSTOM_NODES.to_string()],
                count: 0,
            },
        }
    }
}

/// One non-empty model category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    /// `"{category} ({count})"`
    pub heading: String,
    pub files: Vec<String>,
}

/// Installed models grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelsView {
    pub categories: Vec<CategoryView>,
    /// Set only when the mapping itself is empty or absent
    pub message: Option<String>,
    pub total: usize,
}

impl ModelsView {
    /// Empty categories are skipped. A mapping holding only empty categories
    /// renders nothing and no message, with a total of 0.
    #[must_use]
    pub fn from_models(models: Option<&ModelMap>) -> Self {
        let Some(models) = models.filter(|m| !m.is_empty()) else {
            return Self {
                categories: Vec::new(),
                message: Some(NO_MODELS.to_string()),
                total: 0,
            };
        };

        let categories: Vec<CategoryView> = models
            .iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(category, files)| CategoryView {
                heading: format!("{category} ({})", files.len()),
                files: files.clone(),
            })
            .collect();
        let total = categories.iter().map(|c| c.files.len()).sum();

        Self {
            categories,
            message: None,
            total,
        }
    }
}
