use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use folio_core::{AfterHook, BeforeHook, ErrorHook, FolioApp, FolioError, HookContext, HookResult};
use serde_json::Value;

use crate::services::SiteParams;

pub struct LogCall;

#[async_trait]
impl BeforeHook<Value, SiteParams> for LogCall {
    async fn run(&self, ctx: &mut HookContext<Value, SiteParams>) -> Result<()> {
        tracing::debug!(
            request_id = %ctx.ctx.request_id,
            service = %ctx.service,
            method = ctx.method.as_str(),
            id = ctx.id.as_deref().unwrap_or("-"),
            "-> {} {}",
            ctx.params.method,
            ctx.params.path,
        );
        Ok(())
    }
}

pub struct LogResult;

#[async_trait]
impl AfterHook<Value, SiteParams> for LogResult {
    async fn run(&self, ctx: &mut HookContext<Value, SiteParams>) -> Result<()> {
        let records = match &ctx.result {
            Some(HookResult::Many(items)) => items.len(),
            Some(HookResult::One(_)) => 1,
            None => 0,
        };
        tracing::info!(
            request_id = %ctx.ctx.request_id,
            service = %ctx.service,
            method = ctx.method.as_str(),
            records,
            "<- ok"
        );
        Ok(())
    }
}

pub struct LogError;

#[async_trait]
impl ErrorHook<Value, SiteParams> for LogError {
    async fn run(&self, ctx: &mut HookContext<Value, SiteParams>) -> Result<()> {
        let Some(err) = &ctx.error else {
            return Ok(());
        };

        match FolioError::from_anyhow(err) {
            Some(folio) if !folio.kind.is_server_error() => tracing::info!(
                request_id = %ctx.ctx.request_id,
                service = %ctx.service,
                method = ctx.method.as_str(),
                code = folio.code(),
                "<- {}",
                folio.message
            ),
            _ => tracing::error!(
                request_id = %ctx.ctx.request_id,
                service = %ctx.service,
                method = ctx.method.as_str(),
                error = ?err,
                "<- failed"
            ),
        }
        Ok(())
    }
}

pub fn global_hooks(app: &FolioApp<Value, SiteParams>) {
    app.hooks(|h| {
        h.before_all(Arc::new(LogCall));
        h.after_all(Arc::new(LogResult));
        h.error_all(Arc::new(LogError));
    });
}
