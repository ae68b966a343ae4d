use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use folio_core::{FolioError, ServiceCapabilities, ServiceMethodKind};
use folio_media::StagedFile;
use folio_store::ID_FIELD;
use serde_json::{json, Map, Value};

use crate::services::SiteState;
use crate::utils::payload::{is_blank, parse_json_field, set_path};

/// A file field and where its uploaded URL is stored.
#[derive(Debug, Clone, Copy)]
pub struct ImageField {
    /// Multipart part name.
    pub field: &'static str,
    /// Dotted path in the stored document.
    pub target: &'static str,
    /// Media folder the file is uploaded into.
    pub folder: &'static str,
    /// Must be present on create.
    pub required: bool,
}

impl ImageField {
    pub const fn required(field: &'static str, target: &'static str, folder: &'static str) -> Self {
        Self {
            field,
            target,
            folder,
            required: true,
        }
    }
}

/// Shape of one content collection.
#[derive(Debug, Clone, Copy)]
pub struct ContentSchema {
    pub collection: &'static str,
    /// Used in messages: "Banner item not found".
    pub label: &'static str,
    /// Form fields that must be non-blank on create.
    pub required: &'static [&'static str],
    /// Fields holding JSON, parsed when they arrive as text.
    pub json_fields: &'static [&'static str],
    /// Form field → dotted path in the stored document.
    pub nested: &'static [(&'static str, &'static str)],
    pub images: &'static [ImageField],
    pub methods: &'static [ServiceMethodKind],
    /// `GET /` answers the one record.
    pub singleton: bool,
    /// Create updates the existing record when there is one.
    pub upsert: bool,
}

impl ContentSchema {
    pub fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(self.methods.to_vec())
    }

    fn image(&self, field: &str) -> Option<&ImageField> {
        self.images.iter().find(|i| i.field == field)
    }

    fn target_of<'a>(&self, field: &'a str) -> &'a str {
        self.nested
            .iter()
            .find(|(from, _)| *from == field)
            .map(|(_, to)| *to)
            .unwrap_or(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    /// Partial: absent and blank fields keep their stored value.
    Update,
}

/// Turns request payloads into stored documents for one [`ContentSchema`].
#[derive(Clone)]
pub struct ContentAdapter {
    pub state: Arc<SiteState>,
    pub schema: ContentSchema,
}

impl ContentAdapter {
    pub fn new(state: Arc<SiteState>, schema: ContentSchema) -> Self {
        Self { state, schema }
    }

    pub fn not_found(&self, id: &str) -> anyhow::Error {
        FolioError::not_found(format!("{} not found: {id}", self.schema.label)).into_anyhow()
    }

    /// Response body for a delete.
    pub fn deleted(&self, doc: Value) -> Value {
        json!({
            "message": format!("{} deleted", self.schema.label),
            "deleted": doc,
        })
    }

    pub fn object(&self, data: Value) -> Result<Map<String, Value>> {
        match data {
            Value::Object(map) => Ok(map),
            _ => Err(FolioError::bad_request(format!(
                "{} payload must be a JSON object",
                self.schema.label
            ))
            .into_anyhow()),
        }
    }

    /// Validate `data`, upload its staged files and map fields to their
    /// stored paths. Nothing is uploaded unless the text fields are valid.
    pub async fn prepare(&self, data: Map<String, Value>, mode: WriteMode) -> Result<Value> {
        if mode == WriteMode::Create {
            self.check_required(&data)?;
        }

        let mut doc = Map::new();
        let mut uploads = Vec::new();

        for (key, value) in data {
            if key == ID_FIELD {
                continue;
            }

            if let Some(image) = self.schema.image(&key) {
                match StagedFile::from_value(&value) {
                    Some(file) => uploads.push((*image, file)),
                    // An existing URL sent back as text keeps the stored image.
                    None if mode == WriteMode::Update && !is_blank(&value) && value.is_string() => {
                        set_path(&mut doc, image.target, value)
                    }
                    None => {
                        tracing::debug!(collection = self.schema.collection, field = %key, "ignoring non-file image value");
                    }
                }
                continue;
            }

            if StagedFile::from_value(&value).is_some() {
                tracing::debug!(collection = self.schema.collection, field = %key, "ignoring unexpected file part");
                continue;
            }

            if mode == WriteMode::Update && is_blank(&value) {
                continue;
            }

            let value = if self.schema.json_fields.contains(&key.as_str()) {
                parse_json_field(&key, value)?
            } else {
                value
            };
            set_path(&mut doc, self.schema.target_of(&key), value);
        }

        for (image, file) in uploads {
            let receipt = self
                .state
                .media
                .upload(file, image.folder)
                .await
                .map_err(FolioError::from)?;
            set_path(&mut doc, image.target, Value::String(receipt.url));
        }

        Ok(Value::Object(doc))
    }

    fn check_required(&self, data: &Map<String, Value>) -> Result<()> {
        let mut missing_fields = BTreeMap::new();
        let mut missing_images = BTreeMap::new();

        for field in self.schema.required {
            if data.get(*field).map_or(true, is_blank) {
                missing_fields.insert(*field, vec!["is required"]);
            }
        }
        for image in self.schema.images.iter().filter(|i| i.required) {
            if data.get(image.field).and_then(StagedFile::from_value).is_none() {
                missing_images.insert(image.field, vec!["an image file must be uploaded"]);
            }
        }

        if missing_fields.is_empty() && missing_images.is_empty() {
            return Ok(());
        }

        let message = if missing_fields.is_empty() {
            "An image file must be uploaded".to_string()
        } else {
            format!("{} is missing required fields", self.schema.label)
        };
        missing_fields.extend(missing_images);
        Err(FolioError::bad_request(message)
            .with_errors(json!(missing_fields))
            .into_anyhow())
    }
}
