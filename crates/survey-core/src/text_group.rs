//! Localised copy used by reports and the UI, keyed by `(key, variant)`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANT: &str = "default";

fn default_variant() -> String { DEFAULT_VARIANT.to_owned() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGroup {
  pub key:     String,
  #[serde(default = "default_variant")]
  pub variant: String,
  pub text:    String,
}
