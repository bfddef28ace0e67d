// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use pollview_api::PollBackend;
use pollview_app::{ApiOutcome, ApiRequest, Ticket};
use pollview_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Runs each request on its own worker thread so the UI loop never blocks
/// on the network. Results come back as [`InternalEvent::Response`].
pub struct BackendRuntime<B> {
    backend: B,
    label: String,
}

impl<B> BackendRuntime<B>
where
    B: PollBackend + Clone + Send + 'static,
{
    pub fn new(backend: B, label: impl Into<String>) -> Self {
        Self {
            backend,
            label: label.into(),
        }
    }
}

impl<B> AppRuntime for BackendRuntime<B>
where
    B: PollBackend + Clone + Send + 'static,
{
    fn execute(&mut self, request: ApiRequest) -> ApiOutcome {
        self.backend.execute(request)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }

    fn spawn_request(&mut self, ticket: Ticket, tx: Sender<InternalEvent>) -> Result<()> {
        let backend = self.backend.clone();
        thread::Builder::new()
            .name(format!("pollview-{}", ticket.request.kind().as_str()))
            .spawn(move || {
                let outcome = backend.execute(ticket.request);
                if tx
                    .send(InternalEvent::Response {
                        request_id: ticket.id,
                        outcome,
                    })
                    .is_err()
                {
                    debug!(request_id = %ticket.id, "response dropped after shutdown");
                }
            })
            .context("spawn request worker")?;
        Ok(())
    }
}
