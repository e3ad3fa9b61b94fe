//! Entity model: typed core fields per kind plus an open map of extra attributes.

use crate::error::AppError;
use crate::keys::{normalize, MODULE_PARTITION};
use crate::store::Table;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimum payload contract for one entity kind. Every listed field must be a string when present;
/// fields not listed are carried through unchecked.
#[derive(Clone, Copy, Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl EntitySchema {
    pub fn typed_fields(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityKey {
    pub partition_key: String,
    pub row_key: String,
}

pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;
    const SCHEMA: EntitySchema;

    /// Key of a newly created record.
    fn derive_key(&self) -> EntityKey;

    /// Entity-specific rules for replacing the record stored under `row_key`.
    fn check_update(&self, _row_key: &str) -> Result<(), AppError> {
        Ok(())
    }

    /// Every field, core and extra, as stored properties.
    fn into_properties(self) -> Result<Map<String, Value>, AppError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::BadRequest(format!("{} must serialize to an object", Self::SCHEMA.name))),
            Err(e) => Err(AppError::BadRequest(e.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Module {
    const TABLE: Table = Table::Modules;
    const SCHEMA: EntitySchema = EntitySchema {
        name: "module",
        required: &["title"],
        optional: &["description"],
    };

    fn derive_key(&self) -> EntityKey {
        EntityKey {
            partition_key: MODULE_PARTITION.to_string(),
            row_key: normalize(&self.title),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub module: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Topic {
    const TABLE: Table = Table::Topics;
    const SCHEMA: EntitySchema = EntitySchema {
        name: "topic",
        required: &["module", "title"],
        optional: &["description"],
    };

    fn derive_key(&self) -> EntityKey {
        EntityKey {
            partition_key: normalize(&self.module),
            row_key: normalize(&self.title),
        }
    }

    /// The title is the row key, so it cannot change.
    fn check_update(&self, row_key: &str) -> Result<(), AppError> {
        if normalize(&self.title) != row_key {
            return Err(AppError::Validation("Changing topic title is not allowed.".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub topic: String,
    pub word: String,
    pub part_of_speech: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa_uk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa_us: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pron_uk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pron_us: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning_vi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Card {
    const TABLE: Table = Table::Cards;
    const SCHEMA: EntitySchema = EntitySchema {
        name: "card",
        required: &["topic", "word", "partOfSpeech", "definition"],
        optional: &["ipaUk", "ipaUs", "pronUk", "pronUs", "meaningVi", "exampleSentence"],
    };

    /// Cards are keyed by a random id; identical content still yields distinct records.
    fn derive_key(&self) -> EntityKey {
        EntityKey {
            partition_key: normalize(&self.topic),
            row_key: uuid::Uuid::new_v4().to_string(),
        }
    }
}
