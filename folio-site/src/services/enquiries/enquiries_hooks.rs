use anyhow::Result;
use async_trait::async_trait;
use folio_core::{BeforeHook, HookContext};
use serde_json::Value;

use crate::services::SiteParams;

/// Trim every text field and lowercase the email before validation.
pub struct NormalizeEnquiry;

#[async_trait]
impl BeforeHook<Value, SiteParams> for NormalizeEnquiry {
    async fn run(&self, ctx: &mut HookContext<Value, SiteParams>) -> Result<()> {
        let Some(Value::Object(data)) = ctx.data.as_mut() else {
            return Ok(());
        };

        for (key, value) in data.iter_mut() {
            if let Value::String(s) = value {
                let trimmed = s.trim();
                *s = if key == "email" {
                    trimmed.to_lowercase()
                } else {
                    trimmed.to_string()
                };
            }
        }
        Ok(())
    }
}
