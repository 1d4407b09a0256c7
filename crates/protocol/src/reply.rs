//! Projeção de respostas brutas em valores tipados.

use stormstream_common::ReplyError;

use crate::Frame;

/// Uma entrada de stream: ID e pares campo/valor na ordem de inserção.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

/// Mapeamento ordenado ID → campos, na ordem devolvida pelo servidor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMap {
    entries: Vec<StreamEntry>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Campos da entrada com o ID dado.
    pub fn get(&self, id: &str) -> Option<&[(String, String)]> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.fields.as_slice())
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamEntry> {
        self.entries.iter()
    }

    fn push(&mut self, entry: StreamEntry) {
        self.entries.push(entry);
    }
}

impl IntoIterator for EntryMap {
    type Item = StreamEntry;
    type IntoIter = std::vec::IntoIter<StreamEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryMap {
    type Item = &'a StreamEntry;
    type IntoIter = std::slice::Iter<'a, StreamEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<StreamEntry> for EntryMap {
    fn from_iter<I: IntoIterator<Item = StreamEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Bulk ou Simple como String; Null como None.
pub fn optional_string(frame: Frame) -> Result<Option<String>, ReplyError> {
    match frame {
        Frame::Null => Ok(None),
        other => string(other).map(Some),
    }
}

/// Bulk ou Simple como String.
pub fn string(frame: Frame) -> Result<String, ReplyError> {
    match frame {
        Frame::Simple(s) => Ok(s),
        Frame::Bulk(data) => String::from_utf8(data.to_vec())
            .map_err(|e| ReplyError::InvalidEncoding(e.to_string())),
        other => Err(unexpected("string", &other)),
    }
}

pub fn integer(frame: Frame) -> Result<i64, ReplyError> {
    match frame {
        Frame::Integer(n) => Ok(n),
        other => Err(unexpected("integer", &other)),
    }
}

/// Array de strings, na ordem recebida.
pub fn string_list(frame: Frame) -> Result<Vec<String>, ReplyError> {
    match frame {
        Frame::Array(items) => items.into_iter().map(string).collect(),
        other => Err(unexpected("array", &other)),
    }
}

/// Entradas de stream no formato `[[id, [campo, valor, ...]], ...]` ou como Map.
///
/// Elementos nulos no array (entradas removidas) são ignorados; uma lista de
/// campos nula vira uma lista vazia.
pub fn entry_map(frame: Frame) -> Result<EntryMap, ReplyError> {
    let mut map = EntryMap::new();
    match frame {
        Frame::Array(items) => {
            for item in items {
                match item {
                    Frame::Null => continue,
                    Frame::Array(mut pair) => {
                        if pair.len() != 2 {
                            return Err(ReplyError::MalformedEntry(format!(
                                "esperados 2 elementos, recebidos {}",
                                pair.len()
                            )));
                        }
                        let fields = pair.pop().unwrap_or(Frame::Null);
                        let id = pair.pop().unwrap_or(Frame::Null);
                        map.push(entry(id, fields)?);
                    }
                    other => return Err(unexpected("array", &other)),
                }
            }
        }
        Frame::Map(pairs) => {
            for (id, fields) in pairs {
                map.push(entry(id, fields)?);
            }
        }
        other => return Err(unexpected("array", &other)),
    }
    Ok(map)
}

fn entry(id: Frame, fields: Frame) -> Result<StreamEntry, ReplyError> {
    Ok(StreamEntry {
        id: string(id)?,
        fields: field_pairs(fields)?,
    })
}

fn field_pairs(frame: Frame) -> Result<Vec<(String, String)>, ReplyError> {
    match frame {
        Frame::Null => Ok(Vec::new()),
        Frame::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(ReplyError::OddFieldCount(items.len()));
            }
            let mut pairs = Vec::with_capacity(items.len() / 2);
            let mut iter = items.into_iter();
            while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
                pairs.push((string(field)?, string(value)?));
            }
            Ok(pairs)
        }
        Frame::Map(items) => items
            .into_iter()
            .map(|(field, value)| Ok((string(field)?, string(value)?)))
            .collect(),
        other => Err(unexpected("array", &other)),
    }
}

fn unexpected(expected: &'static str, found: &Frame) -> ReplyError {
    ReplyError::UnexpectedType {
        expected,
        found: found.type_name(),
    }
}
