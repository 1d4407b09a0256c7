use stormstream_common::EncodingError;

use super::{FORCE, IDLE, RETRYCOUNT, TIME, ToArgs};

/// Opções do comando XCLAIM.
///
/// Valores numéricos iguais a zero não são emitidos: zero e "não configurado"
/// são indistinguíveis nesta codificação.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOptions {
    idle_ms: u64,
    idle_unix_time_ms: u64,
    retry_count: u64,
    force: bool,
}

impl ClaimOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tempo ocioso da entrada (ms) após o claim.
    #[must_use]
    pub fn idle(mut self, idle_ms: u64) -> Self {
        self.idle_ms = idle_ms;
        self
    }

    /// Como `idle`, mas como timestamp unix absoluto em ms.
    #[must_use]
    pub fn idle_unix_time(mut self, unix_time_ms: u64) -> Self {
        self.idle_unix_time_ms = unix_time_ms;
        self
    }

    /// Sobrescreve o contador de entregas.
    #[must_use]
    pub fn retry_count(mut self, retry_count: u64) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Cria a entrada pendente mesmo que o ID não esteja na PEL.
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn is_force(&self) -> bool {
        self.force
    }
}

impl ToArgs for ClaimOptions {
    fn to_args(&self) -> Result<Vec<String>, EncodingError> {
        let mut args = Vec::new();
        if self.idle_ms > 0 {
            args.push(IDLE.to_string());
            args.push(self.idle_ms.to_string());
        }
        if self.idle_unix_time_ms > 0 {
            args.push(TIME.to_string());
            args.push(self.idle_unix_time_ms.to_string());
        }
        if self.retry_count > 0 {
            args.push(RETRYCOUNT.to_string());
            args.push(self.retry_count.to_string());
        }
        if self.force {
            args.push(FORCE.to_string());
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_emit_nothing() {
        assert!(ClaimOptions::new().to_args().unwrap().is_empty());
    }

    #[test]
    fn retry_count_and_force() {
        let opts = ClaimOptions::new().retry_count(3).force();
        assert_eq!(opts.to_args().unwrap(), vec!["RETRYCOUNT", "3", "FORCE"]);
    }

    #[test]
    fn fixed_order_regardless_of_builder_order() {
        let opts = ClaimOptions::new()
            .force()
            .retry_count(2)
            .idle_unix_time(1_700_000_000_000)
            .idle(500);
        assert_eq!(
            opts.to_args().unwrap(),
            vec![
                "IDLE",
                "500",
                "TIME",
                "1700000000000",
                "RETRYCOUNT",
                "2",
                "FORCE"
            ]
        );
    }

    #[test]
    fn zero_values_are_omitted() {
        let opts = ClaimOptions::new().idle(0).idle_unix_time(0).retry_count(0);
        assert!(opts.to_args().unwrap().is_empty());
    }

    #[test]
    fn never_emits_justid() {
        let opts = ClaimOptions::new().idle(1).retry_count(1).force();
        assert!(!opts.to_args().unwrap().iter().any(|a| a == "JUSTID"));
    }
}
