use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Bound;

use stormstream_common::{AUTO_ID, StorageError};
use stormstream_protocol::ClaimModifiers;
use stormstream_protocol::options::{TrimExactness, TrimMethod, TrimOptions};

/// Pares campo/valor de uma entrada, na ordem de inserção.
pub type Fields = Vec<(String, String)>;

/// ID de entrada: (timestamp em ms, sequência).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Faz o parse de `ms-seq` ou `ms` (sequência assumida como `default_seq`).
    pub fn parse_with_default(s: &str, default_seq: u64) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidStreamId(s.to_string());
        match s.split_once('-') {
            Some((ms, seq)) => Ok(Self {
                ms: ms.parse().map_err(|_| invalid())?,
                seq: seq.parse().map_err(|_| invalid())?,
            }),
            None => Ok(Self {
                ms: s.parse().map_err(|_| invalid())?,
                seq: default_seq,
            }),
        }
    }

    pub fn parse(s: &str) -> Result<Self, StorageError> {
        Self::parse_with_default(s, 0)
    }

    /// Limite inferior de XRANGE: `-` ou ID (sequência 0 se omitida).
    pub fn parse_start(s: &str) -> Result<Self, StorageError> {
        if s == "-" {
            Ok(Self::MIN)
        } else {
            Self::parse_with_default(s, 0)
        }
    }

    /// Limite superior de XRANGE: `+` ou ID (sequência máxima se omitida).
    pub fn parse_end(s: &str) -> Result<Self, StorageError> {
        if s == "+" {
            Ok(Self::MAX)
        } else {
            Self::parse_with_default(s, u64::MAX)
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// Entrada na lista de pendentes (PEL) de um grupo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub consumer: Option<String>,
    pub delivery_time_ms: u64,
    pub delivery_count: u64,
}

/// Grupo de consumidores.
#[derive(Debug, Clone, Default)]
pub struct ConsumerGroup {
    pub last_delivered: StreamId,
    pub pending: BTreeMap<StreamId, PendingEntry>,
    pub consumers: HashSet<String>,
}

/// Limiar de trimming já convertido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimBound {
    MaxLen(usize),
    MinId(StreamId),
}

/// Trimming validado antes de qualquer escrita no stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPlan {
    pub bound: TrimBound,
    /// Máximo de entradas removidas (só limitado em modo `~` com LIMIT)
    pub limit: usize,
}

impl TrimPlan {
    pub fn resolve(trim: &TrimOptions) -> Result<Self, StorageError> {
        let bound = match trim.method() {
            TrimMethod::MaxLen => TrimBound::MaxLen(
                trim.threshold()
                    .parse()
                    .map_err(|_| StorageError::InvalidStreamId(trim.threshold().to_string()))?,
            ),
            TrimMethod::MinId => TrimBound::MinId(StreamId::parse(trim.threshold())?),
        };
        let limit = match trim.exactness() {
            TrimExactness::Approximate if trim.limit() > 0 => trim.limit() as usize,
            _ => usize::MAX,
        };
        Ok(Self { bound, limit })
    }
}

/// Stream: log append-only de entradas ordenadas por ID.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    entries: BTreeMap<StreamId, Fields>,
    last_id: StreamId,
    groups: HashMap<String, ConsumerGroup>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    pub fn group(&self, name: &str) -> Option<&ConsumerGroup> {
        self.groups.get(name)
    }

    /// Resolve o ID pedido (`*`, `ms-*`, `ms-seq` ou `ms`) contra o topo atual.
    fn next_id(&self, requested: &str, now_ms: u64) -> Result<StreamId, StorageError> {
        let last = self.last_id;
        let id = if requested == AUTO_ID {
            if now_ms > last.ms {
                StreamId::new(now_ms, 0)
            } else {
                let seq = last.seq.checked_add(1).ok_or(StorageError::IdTooSmall)?;
                StreamId::new(last.ms, seq)
            }
        } else if let Some(ms) = requested.strip_suffix("-*") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| StorageError::InvalidStreamId(requested.to_string()))?;
            if ms == last.ms {
                let seq = last.seq.checked_add(1).ok_or(StorageError::IdTooSmall)?;
                StreamId::new(ms, seq)
            } else {
                StreamId::new(ms, 0)
            }
        } else {
            StreamId::parse(requested)?
        };

        if id == StreamId::MIN {
            return Err(StorageError::IdZero);
        }
        if id <= last {
            return Err(StorageError::IdTooSmall);
        }
        Ok(id)
    }

    pub fn add(&mut self, requested: &str, fields: Fields, now_ms: u64) -> Result<StreamId, StorageError> {
        let id = self.next_id(requested, now_ms)?;
        self.entries.insert(id, fields);
        self.last_id = id;
        Ok(id)
    }

    /// Remove entradas antigas. Retorna quantas foram removidas.
    pub fn trim(&mut self, trim: &TrimOptions) -> Result<usize, StorageError> {
        let plan = TrimPlan::resolve(trim)?;
        Ok(self.apply_trim(plan))
    }

    /// Aplica um trimming já validado; não falha.
    pub fn apply_trim(&mut self, plan: TrimPlan) -> usize {
        let mut removed = 0;
        while removed < plan.limit {
            let expired = match (plan.bound, self.entries.first_key_value()) {
                (TrimBound::MaxLen(max_len), Some(_)) => self.entries.len() > max_len,
                (TrimBound::MinId(min_id), Some((id, _))) => *id < min_id,
                (_, None) => false,
            };
            if !expired {
                break;
            }
            self.entries.pop_first();
            removed += 1;
        }
        removed
    }

    pub fn range(&self, start: StreamId, end: StreamId, count: Option<usize>) -> Vec<(StreamId, Fields)> {
        if start > end {
            return Vec::new();
        }
        self.entries
            .range(start..=end)
            .take(count.unwrap_or(usize::MAX))
            .map(|(id, fields)| (*id, fields.clone()))
            .collect()
    }

    /// Cria um grupo. `$` posiciona o grupo no topo atual do stream.
    pub fn create_group(&mut self, name: &str, id: &str) -> Result<(), StorageError> {
        if self.groups.contains_key(name) {
            return Err(StorageError::GroupExists(name.to_string()));
        }
        let last_delivered = if id == "$" {
            self.last_id
        } else {
            StreamId::parse(id)?
        };
        self.groups.insert(
            name.to_string(),
            ConsumerGroup {
                last_delivered,
                ..ConsumerGroup::default()
            },
        );
        Ok(())
    }

    /// XREADGROUP para um stream. Com `>` entrega entradas novas e as registra
    /// na PEL; com um ID devolve o histórico pendente do consumidor após esse ID.
    pub fn read_group(
        &mut self,
        key: &str,
        group: &str,
        consumer: &str,
        id: &str,
        count: Option<usize>,
        now_ms: u64,
    ) -> Result<Vec<(StreamId, Option<Fields>)>, StorageError> {
        let entries = &self.entries;
        let cg = self.groups.get_mut(group).ok_or_else(|| StorageError::NoGroup {
            key: key.to_string(),
            group: group.to_string(),
        })?;
        cg.consumers.insert(consumer.to_string());
        let count = count.filter(|c| *c > 0).unwrap_or(usize::MAX);

        if id == ">" {
            let delivered: Vec<(StreamId, Option<Fields>)> = entries
                .range((Bound::Excluded(cg.last_delivered), Bound::Unbounded))
                .take(count)
                .map(|(id, fields)| (*id, Some(fields.clone())))
                .collect();
            for (id, _) in &delivered {
                cg.pending.insert(
                    *id,
                    PendingEntry {
                        consumer: Some(consumer.to_string()),
                        delivery_time_ms: now_ms,
                        delivery_count: 1,
                    },
                );
                cg.last_delivered = *id;
            }
            return Ok(delivered);
        }

        let after = StreamId::parse(id)?;
        Ok(cg
            .pending
            .range((Bound::Excluded(after), Bound::Unbounded))
            .filter(|(_, nack)| nack.consumer.as_deref() == Some(consumer))
            .take(count)
            .map(|(id, _)| (*id, entries.get(id).cloned()))
            .collect())
    }

    /// Transfere entradas pendentes para `consumer`.
    #[allow(clippy::too_many_arguments)]
    pub fn claim(
        &mut self,
        key: &str,
        group: &str,
        consumer: &str,
        min_idle_ms: u64,
        ids: &[StreamId],
        modifiers: &ClaimModifiers,
        now_ms: u64,
    ) -> Result<Vec<(StreamId, Fields)>, StorageError> {
        let entries = &self.entries;
        let cg = self.groups.get_mut(group).ok_or_else(|| StorageError::NoGroup {
            key: key.to_string(),
            group: group.to_string(),
        })?;

        let delivery_time_ms = match (modifiers.time_ms, modifiers.idle_ms) {
            (Some(time), _) => time,
            (None, Some(idle)) => now_ms.saturating_sub(idle),
            (None, None) => now_ms,
        };

        cg.consumers.insert(consumer.to_string());
        let mut claimed = Vec::new();
        for id in ids {
            if !cg.pending.contains_key(id) {
                if !(modifiers.force && entries.contains_key(id)) {
                    continue;
                }
                // Entrada forçada: ainda sem dono, não passa pelo filtro de ociosidade
                cg.pending.insert(
                    *id,
                    PendingEntry {
                        consumer: None,
                        delivery_time_ms: now_ms,
                        delivery_count: 0,
                    },
                );
            }

            let Some(fields) = entries.get(id) else {
                // A entrada foi apagada do stream: sai da PEL
                cg.pending.remove(id);
                continue;
            };

            let Some(nack) = cg.pending.get_mut(id) else {
                continue;
            };
            if nack.consumer.is_some()
                && min_idle_ms > 0
                && now_ms.saturating_sub(nack.delivery_time_ms) < min_idle_ms
            {
                continue;
            }

            nack.consumer = Some(consumer.to_string());
            nack.delivery_time_ms = delivery_time_ms;
            match modifiers.retry_count {
                Some(retry) => nack.delivery_count = retry,
                None if !modifiers.just_id => nack.delivery_count += 1,
                None => {}
            }
            claimed.push((*id, fields.clone()));
        }
        Ok(claimed)
    }

    pub fn ack(&mut self, group: &str, ids: &[StreamId]) -> usize {
        match self.groups.get_mut(group) {
            Some(cg) => ids
                .iter()
                .filter(|id| cg.pending.remove(id).is_some())
                .count(),
            None => 0,
        }
    }
}
