use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use stormstream_common::StorageError;
use stormstream_protocol::ClaimModifiers;
use stormstream_protocol::options::TrimOptions;

use crate::stream::{Fields, Stream, StreamId, TrimPlan};

/// Estado compartilhado entre todos os handles.
struct SharedState {
    streams: DashMap<String, Stream>,
}

/// Entradas lidas por XREADGROUP, agrupadas por chave.
pub type GroupRead = Vec<(String, Vec<(StreamId, Option<Fields>)>)>;

/// Handle para o store in-memory de streams.
#[derive(Clone)]
pub struct Db {
    shared: Arc<SharedState>,
}

impl Db {
    pub fn new() -> Self {
        Db {
            shared: Arc::new(SharedState {
                streams: DashMap::new(),
            }),
        }
    }

    /// Número de chaves no store.
    pub fn len(&self) -> usize {
        self.shared.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.streams.is_empty()
    }

    /// Adiciona uma entrada. Retorna None se o stream não existe e
    /// `make_stream` é falso.
    pub fn xadd(
        &self,
        key: &str,
        make_stream: bool,
        trim: Option<&TrimOptions>,
        id: &str,
        fields: Fields,
    ) -> Result<Option<StreamId>, StorageError> {
        // Trimming inválido rejeita o comando antes de qualquer escrita
        let plan = trim.map(TrimPlan::resolve).transpose()?;
        let now = now_ms();
        let added = match self.shared.streams.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let stream = occupied.get_mut();
                let added = stream.add(id, fields, now)?;
                if let Some(plan) = plan {
                    stream.apply_trim(plan);
                }
                added
            }
            Entry::Vacant(vacant) => {
                if !make_stream {
                    return Ok(None);
                }
                let mut stream = Stream::new();
                let added = stream.add(id, fields, now)?;
                if let Some(plan) = plan {
                    stream.apply_trim(plan);
                }
                vacant.insert(stream);
                added
            }
        };
        debug!("XADD {key} -> {added}");
        Ok(Some(added))
    }

    pub fn xtrim(&self, key: &str, trim: &TrimOptions) -> Result<usize, StorageError> {
        match self.shared.streams.get_mut(key) {
            Some(mut stream) => stream.trim(trim),
            None => Ok(0),
        }
    }

    pub fn xlen(&self, key: &str) -> usize {
        self.shared
            .streams
            .get(key)
            .map(|stream| stream.len())
            .unwrap_or(0)
    }

    pub fn xrange(
        &self,
        key: &str,
        start: &str,
        end: &str,
        count: Option<usize>,
    ) -> Result<Vec<(StreamId, Fields)>, StorageError> {
        let start = StreamId::parse_start(start)?;
        let end = StreamId::parse_end(end)?;
        Ok(self
            .shared
            .streams
            .get(key)
            .map(|stream| stream.range(start, end, count))
            .unwrap_or_default())
    }

    pub fn xgroup_create(
        &self,
        key: &str,
        group: &str,
        id: &str,
        make_stream: bool,
    ) -> Result<(), StorageError> {
        let mut stream = match self.shared.streams.entry(key.to_string()) {
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(vacant) => {
                if !make_stream {
                    return Err(StorageError::KeyNotFound);
                }
                vacant.insert(Stream::new())
            }
        };
        stream.create_group(group, id)
    }

    pub fn xreadgroup(
        &self,
        group: &str,
        consumer: &str,
        count: Option<usize>,
        streams: &[(String, String)],
    ) -> Result<GroupRead, StorageError> {
        let now = now_ms();
        let mut result = Vec::with_capacity(streams.len());
        for (key, id) in streams {
            let mut stream = self
                .shared
                .streams
                .get_mut(key)
                .ok_or_else(|| StorageError::NoGroup {
                    key: key.clone(),
                    group: group.to_string(),
                })?;
            let entries = stream.read_group(key, group, consumer, id, count, now)?;
            if !entries.is_empty() {
                result.push((key.clone(), entries));
            }
        }
        Ok(result)
    }

    pub fn xclaim(
        &self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[String],
        modifiers: &ClaimModifiers,
    ) -> Result<Vec<(StreamId, Fields)>, StorageError> {
        // IDs inválidos abortam o comando antes de qualquer claim
        let ids = ids
            .iter()
            .map(|id| StreamId::parse(id))
            .collect::<Result<Vec<_>, _>>()?;
        let mut stream = self
            .shared
            .streams
            .get_mut(key)
            .ok_or_else(|| StorageError::NoGroup {
                key: key.to_string(),
                group: group.to_string(),
            })?;
        let claimed = stream.claim(key, group, consumer, min_idle_ms, &ids, modifiers, now_ms())?;
        debug!("XCLAIM {key} {group} {consumer}: {} entradas", claimed.len());
        Ok(claimed)
    }

    pub fn xack(&self, key: &str, group: &str, ids: &[String]) -> Result<usize, StorageError> {
        let ids = ids
            .iter()
            .map(|id| StreamId::parse(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .shared
            .streams
            .get_mut(key)
            .map(|mut stream| stream.ack(group, &ids))
            .unwrap_or(0))
    }

    pub fn del(&self, keys: &[String]) -> usize {
        let mut count = 0;
        for key in keys {
            if self.shared.streams.remove(key).is_some() {
                count += 1;
            }
        }
        count
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
