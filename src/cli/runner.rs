//! CLI command execution

use crate::cli::{Cli, Commands};
use crate::config::{AdapterConfig, TargetKind};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::sink::{CloudStore, KafkaTarget, Operation, ParquetTarget, Target};
use serde::Deserialize;
use std::io::BufRead;
use std::sync::Arc;
use tracing::info;

/// One line of a replay event file.
#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    op: Option<String>,
    #[serde(default, rename = "type")]
    entity_type: Option<String>,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    commit: Option<String>,
}

/// Executes CLI commands against a configured target.
pub struct Runner {
    cli: Cli,
}

impl Runner {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(&self) -> Result<()> {
        let config = AdapterConfig::from_yaml_file(&self.cli.config)?;
        let mut target = build_target(&config)?;

        let result = match &self.cli.command {
            Commands::Replay {
                events,
                commit_rest,
            } => self.replay(target.as_mut(), events, *commit_rest).await,
            Commands::Check => self.check(target.as_mut()).await,
        };

        let closed = target.close().await;
        result.and(closed)
    }

    async fn replay(
        &self,
        target: &mut dyn Target,
        events: &std::path::Path,
        commit_rest: bool,
    ) -> Result<()> {
        let file = std::fs::File::open(events)?;
        let mut mutations = 0usize;
        let mut commits = 0usize;

        for (number, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .map_err(|e| Error::config(format!("line {}: {e}", number + 1)))?;

            if let Some(transaction_id) = &event.commit {
                target.on_commit(transaction_id).await?;
                commits += 1;
                continue;
            }

            let op: Operation = event
                .op
                .as_deref()
                .ok_or_else(|| Error::config(format!("line {}: missing op", number + 1)))?
                .parse()?;
            let entity_type = event
                .entity_type
                .as_deref()
                .ok_or_else(|| Error::config(format!("line {}: missing type", number + 1)))?;
            let record = event
                .record
                .as_ref()
                .ok_or_else(|| Error::config(format!("line {}: missing record", number + 1)))?;

            target
                .on_mutation(op, entity_type, Record::from_json(record)?)
                .await?;
            mutations += 1;
        }

        if commit_rest {
            target.on_commit("replay-final").await?;
            commits += 1;
        }

        info!(mutations, commits, "replay complete");
        Ok(())
    }

    async fn check(&self, target: &mut dyn Target) -> Result<()> {
        if target.is_service_okay().await {
            info!("sink service is reachable");
            Ok(())
        } else {
            Err(Error::config("sink service is not reachable"))
        }
    }
}

fn build_target(config: &AdapterConfig) -> Result<Box<dyn Target>> {
    match config.target {
        TargetKind::Parquet => {
            let parquet = config.parquet()?;
            let store = Arc::new(CloudStore::parse(&parquet.bucket)?);
            Ok(Box::new(ParquetTarget::new(
                parquet.clone(),
                Arc::new(config.metadata.clone()),
                store,
            )))
        }
        TargetKind::Kafka => Ok(Box::new(KafkaTarget::new(config.kafka()?)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_parsing() {
        let event: Event =
            serde_json::from_str(r#"{"op":"create","type":"EMPL","record":{"ISN":1}}"#).unwrap();
        assert_eq!(event.op.as_deref(), Some("create"));
        assert_eq!(event.entity_type.as_deref(), Some("EMPL"));
        assert!(event.record.is_some());
        assert!(event.commit.is_none());

        let event: Event = serde_json::from_str(r#"{"commit":"tx-1"}"#).unwrap();
        assert_eq!(event.commit.as_deref(), Some("tx-1"));
    }
}
