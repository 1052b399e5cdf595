//! Line-delimited JSON host.
//!
//! Each input line is a [`HostCommand`]. Every command produces exactly one
//! `response` line; client events produced while handling it are written as
//! `event` lines before that response. Events raised later by expiry timers
//! are written as they happen.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toastd_core::{EventType, Identity, NotificationEvent, StoredApplication, ToggleSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::NotificationOptions;
use crate::clients::{Delivery, LocalEnvironment, LocalTransport};
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::service::NotificationService;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum HostCommand {
    Connect {
        client: Identity,
        /// Launch metadata for the client's application
        #[serde(default)]
        application: Option<StoredApplication>,
    },
    Disconnect {
        client: Identity,
    },
    AddListener {
        client: Identity,
        event: EventType,
    },
    RemoveListener {
        client: Identity,
        event: EventType,
    },
    Create {
        client: Identity,
        options: NotificationOptions,
    },
    Clear {
        client: Identity,
        id: String,
    },
    ClearAll {
        client: Identity,
    },
    GetAll {
        client: Identity,
    },
    Toggle {
        #[serde(default = "default_toggle_source")]
        source: ToggleSource,
    },
    Blur,
    ToggleLock,
    /// Click on a notification body; `id` is the composite id
    Click {
        id: String,
    },
    ClickButton {
        id: String,
        button: usize,
    },
    Close {
        id: String,
    },
}

fn default_toggle_source() -> ToggleSource {
    ToggleSource::Tray
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostOutput {
    Response {
        ok: bool,
        #[serde(skip_serializing_if = "Value::is_null")]
        result: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        target: Identity,
        event: NotificationEvent,
    },
}

impl HostOutput {
    fn ok(result: Value) -> Self {
        HostOutput::Response {
            ok: true,
            result,
            error: None,
        }
    }

    fn error(error: impl std::fmt::Display) -> Self {
        HostOutput::Response {
            ok: false,
            result: Value::Null,
            error: Some(error.to_string()),
        }
    }
}

impl From<Delivery> for HostOutput {
    fn from(delivery: Delivery) -> Self {
        HostOutput::Event {
            target: delivery.target,
            event: delivery.event,
        }
    }
}

pub struct Host {
    service: NotificationService,
    transport: Arc<LocalTransport>,
    environment: Arc<LocalEnvironment>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
}

impl Host {
    pub async fn start(config: AppConfig) -> Result<Self, StoreError> {
        let (transport, deliveries) = LocalTransport::new();
        let environment = Arc::new(LocalEnvironment::always_running());
        let service = NotificationService::builder(transport.clone())
            .with_config(config)
            .with_environment(environment.clone())
            .build()
            .await?;
        Ok(Self {
            service,
            transport,
            environment,
            deliveries,
        })
    }

    pub fn service(&self) -> &NotificationService {
        &self.service
    }

    pub async fn execute(&self, command: HostCommand) -> HostOutput {
        debug!(?command, "Executing host command");
        match command {
            HostCommand::Connect {
                client,
                application,
            } => {
                if let Some(app) = application {
                    self.environment.register(app);
                }
                HostOutput::ok(Value::Bool(self.transport.connect(client)))
            }
            HostCommand::Disconnect { client } => {
                HostOutput::ok(Value::Bool(self.transport.disconnect(&client)))
            }
            HostCommand::AddListener { client, event } => {
                self.service.api(client).add_event_listener(event).await;
                HostOutput::ok(Value::Null)
            }
            HostCommand::RemoveListener { client, event } => {
                self.service.api(client).remove_event_listener(event);
                HostOutput::ok(Value::Null)
            }
            HostCommand::Create { client, options } => {
                match self.service.api(client).create(options).await {
                    Ok(notification) => to_output(&notification),
                    Err(e) => HostOutput::error(e),
                }
            }
            HostCommand::Clear { client, id } => {
                respond(self.service.api(client).clear(&id).await)
            }
            HostCommand::ClearAll { client } => {
                respond(self.service.api(client).clear_all().await)
            }
            HostCommand::GetAll { client } => to_output(&self.service.api(client).get_all()),
            HostCommand::Toggle { source } => respond(self.service.center().toggle(source).await),
            HostCommand::Blur => respond(self.service.center().blur().await),
            HostCommand::ToggleLock => respond(self.service.center().toggle_lock().await),
            HostCommand::Click { id } => {
                respond(self.service.center().click_notification(&id).await)
            }
            HostCommand::ClickButton { id, button } => {
                respond(self.service.center().click_button(&id, button).await)
            }
            HostCommand::Close { id } => respond(self.service.center().close(&id).await),
        }
    }

    pub async fn handle_line(&self, line: &str) -> HostOutput {
        match serde_json::from_str::<HostCommand>(line) {
            Ok(command) => self.execute(command).await,
            Err(e) => {
                warn!(error = %e, "Invalid host command");
                HostOutput::error(format!("invalid command: {e}"))
            }
        }
    }

    /// Serves commands from `input` until it ends, writing output lines to
    /// `output`.
    pub async fn serve<R, W>(mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let response = self.handle_line(&line).await;
                    self.flush_deliveries(&mut output).await?;
                    write_line(&mut output, &response).await?;
                }
                Some(delivery) = self.deliveries.recv() => {
                    write_line(&mut output, &HostOutput::from(delivery)).await?;
                }
            }
        }
        self.flush_deliveries(&mut output).await?;
        output.flush().await
    }

    async fn flush_deliveries<W>(&mut self, output: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Ok(delivery) = self.deliveries.try_recv() {
            write_line(output, &HostOutput::from(delivery)).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn to_output<T: Serialize>(value: &T) -> HostOutput {
    match serde_json::to_value(value) {
        Ok(value) => HostOutput::ok(value),
        Err(e) => HostOutput::error(e),
    }
}

fn respond<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> HostOutput {
    match result {
        Ok(value) => to_output(&value),
        Err(e) => HostOutput::error(e),
    }
}

async fn write_line<W>(output: &mut W, value: &HostOutput) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let command: HostCommand = serde_json::from_str(
            r#"{"command":"create","client":{"uuid":"app","name":"main"},"options":{"title":"t","body":"b"}}"#,
        )
        .unwrap();
        assert!(matches!(command, HostCommand::Create { .. }));

        let command: HostCommand = serde_json::from_str(r#"{"command":"toggle"}"#).unwrap();
        assert_eq!(
            command,
            HostCommand::Toggle {
                source: ToggleSource::Tray
            }
        );

        let command: HostCommand =
            serde_json::from_str(r#"{"command":"click-button","id":"app:n1","button":1}"#)
                .unwrap();
        assert_eq!(
            command,
            HostCommand::ClickButton {
                id: "app:n1".into(),
                button: 1
            }
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        tokio_test::block_on(async {
            let host = Host::start(AppConfig::default()).await.unwrap();
            let output = host.handle_line(r#"{"command":"explode"}"#).await;
            assert!(matches!(output, HostOutput::Response { ok: false, .. }));
        });
    }

    #[test]
    fn test_output_shape() {
        let json = serde_json::to_value(HostOutput::ok(Value::Bool(true))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "response", "ok": true, "result": true}));

        let json = serde_json::to_value(HostOutput::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "response", "ok": false, "error": "nope"}));
    }
}
