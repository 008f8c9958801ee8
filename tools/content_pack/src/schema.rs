use std::collections::HashMap;

use serde::Deserialize;

/// Current content pack schema version.
pub const PACK_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct ContentPack {
    pub version: u32,
    #[serde(default)]
    pub macros: HashMap<String, MacroDef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MacroDef {
    Body { body: String },
    Lines { lines: Vec<String> },
    Inline(String),
}

impl MacroDef {
    /// Macro body as stored in the macro table: lines joined with `\n`.
    pub fn body(&self) -> String {
        match self {
            MacroDef::Body { body } => body.clone(),
            MacroDef::Lines { lines } => lines.join("\n"),
            MacroDef::Inline(body) => body.clone(),
        }
    }
}

impl ContentPack {
    pub fn into_mapping(self) -> HashMap<String, String> {
        self.macros
            .into_iter()
            .map(|(name, def)| {
                let body = def.body();
                (name, body)
            })
            .collect()
    }
}
