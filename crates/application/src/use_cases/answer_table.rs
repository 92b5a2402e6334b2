use crate::ports::Handler;
use crate::services::MessageWriter;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};
use wiredns_domain::{ConfigError, LocalDnsRecord, Query, Question, Resource};

/// A handler that answers from a fixed question → records map.
///
/// Names are matched case-insensitively. Questions with no entry get an empty
/// NOERROR reply.
#[derive(Debug, Clone, Default)]
pub struct AnswerTable {
    entries: HashMap<Question, Vec<Resource>>,
}

impl AnswerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question: Question, resource: Resource) -> &mut Self {
        self.entries
            .entry(normalize(&question))
            .or_default()
            .push(resource);
        self
    }

    pub fn with(mut self, question: Question, resource: Resource) -> Self {
        self.insert(question, resource);
        self
    }

    pub fn from_local_records(
        records: &[LocalDnsRecord],
        default_domain: &Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for record in records {
            let (question, resource) = record
                .to_resource(default_domain)
                .map_err(ConfigError::Validation)?;
            table.insert(question, resource);
        }
        Ok(table)
    }

    pub fn lookup(&self, question: &Question) -> &[Resource] {
        self.entries
            .get(&normalize(question))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(question: &Question) -> Question {
    if question.name.bytes().any(|b| b.is_ascii_uppercase()) {
        Question {
            name: question.name.to_ascii_lowercase().into(),
            ..question.clone()
        }
    } else {
        question.clone()
    }
}

#[async_trait]
impl Handler for AnswerTable {
    async fn serve_dns(&self, mut writer: MessageWriter, query: Query) {
        for question in &query.questions {
            let resources = self.lookup(question);
            debug!(
                client = %query.remote_addr,
                question = %question,
                answers = resources.len(),
                "Answer table lookup"
            );
            for resource in resources {
                writer.push_answer(resource.clone());
            }
        }
        writer.set_authoritative(true);

        if let Err(e) = writer.reply().await {
            warn!(client = %query.remote_addr, error = %e, "Failed to send reply");
        }
    }
}
