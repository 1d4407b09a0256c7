use stormstream_common::{AUTO_ID, EncodingError};

use super::{NOMKSTREAM, ToArgs, TriState, TrimOptions};

/// Opções do comando XADD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOptions {
    id: String,
    make_stream: TriState,
    trim: Option<TrimOptions>,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A entrada será adicionada com este ID em vez de um gerado pelo servidor.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Não cria o stream se a chave não existir (NOMKSTREAM).
    #[must_use]
    pub fn dont_make_stream(mut self) -> Self {
        self.make_stream = TriState::False;
        self
    }

    /// Faz trimming das entradas antigas junto com a inserção.
    #[must_use]
    pub fn trim(mut self, trim: TrimOptions) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn make_stream(&self) -> TriState {
        self.make_stream
    }

    pub fn trim_options(&self) -> Option<&TrimOptions> {
        self.trim.as_ref()
    }
}

impl ToArgs for AddOptions {
    fn to_args(&self) -> Result<Vec<String>, EncodingError> {
        let mut args = Vec::new();
        if self.make_stream == TriState::False {
            args.push(NOMKSTREAM.to_string());
        }
        if let Some(ref trim) = self.trim {
            args.extend(trim.to_args()?);
        }
        // O ID (ou "*") fecha a lista; os campos vêm depois dele
        if self.id.is_empty() {
            args.push(AUTO_ID.to_string());
        } else {
            args.push(self.id.clone());
        }
        Ok(args)
    }
}
