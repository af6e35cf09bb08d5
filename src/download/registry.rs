/// A model category the helper server will download into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelType {
    /// Value sent as `model_type`, also the status category key
    pub name: &'static str,
    pub description: &'static str,
}

/// Categories the helper server accepts, relative to the ComfyUI root
pub const MODEL_TYPES: &[ModelType] = &[
    ModelType {
        name: "models/checkpoints",
        description: "Full model checkpoints",
    },
    ModelType {
        name: "models/vae",
        description: "VAE encoders/decoders",
    },
    ModelType {
        name: "models/unet",
        description: "Standalone UNet weights",
    },
    ModelType {
        name: "models/diffusion_models",
        description: "Diffusion transformer weights",
    },
    ModelType {
        name: "models/text_encoders",
        description: "Text encoders (T5, CLIP-L, ...)",
    },
    ModelType {
        name: "models/loras",
        description: "LoRA adapters",
    },
    ModelType {
        name: "models/upscale_models",
        description: "Upscalers",
    },
    ModelType {
        name: "models/clip",
        description: "CLIP models",
    },
    ModelType {
        name: "models/controlnet",
        description: "ControlNet models",
    },
    ModelType {
        name: "models/clip_vision",
        description: "CLIP vision encoders",
    },
    ModelType {
        name: "models/ipadapter",
        description: "IP-Adapter models",
    },
];

/// Whether the server will accept `name` as a `model_type`
#[must_use]
pub fn is_known_model_type(name: &str) -> bool {
    ModelType::find(name).is_some()
}

impl ModelType {
    /// Find model type by name
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        MODEL_TYPES.iter().find(|m| m.name == name)
    }

    /// Get all model type names
    #[must_use]
    pub fn all_names() -> Vec<&'static str> {
        MODEL_TYPES.iter().map(|m| m.name).collect()
    }

    /// Find closest match, accepting names without the `models/` prefix
    #[must_use]
    pub fn suggest(name: &str) -> Option<&'static str> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let qualified = if name.starts_with("models/") {
            name.to_string()
        } else {
            format!("models/{name}")
        };

        MODEL_TYPES
            .iter()
            .map(|m| (m.name, edit_distance(&qualified, m.name)))
            .min_by_key(|(_, dist)| *dist)
            .filter(|(_, dist)| *dist <= 2)
            .map(|(type_name, _)| type_name)
    }
}

/// Edit distance between two names, keeping one previous DP row
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != *cb);
            row[j + 1] = substitute.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}
