use stormstream_common::EncodingError;

use super::{COUNT, MATCH, NOSCORES, ToArgs};

/// Opções comuns aos comandos de scan por cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    match_pattern: String,
    count: u64,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtra elementos pelo padrão glob.
    #[must_use]
    pub fn match_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = pattern.into();
        self
    }

    /// Sugestão de quantos elementos retornar por iteração.
    #[must_use]
    pub fn count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }
}

impl ToArgs for ScanOptions {
    fn to_args(&self) -> Result<Vec<String>, EncodingError> {
        let mut args = Vec::new();
        if !self.match_pattern.is_empty() {
            args.push(MATCH.to_string());
            args.push(self.match_pattern.clone());
        }
        if self.count > 0 {
            args.push(COUNT.to_string());
            args.push(self.count.to_string());
        }
        Ok(args)
    }
}

/// Opções do ZSCAN: as opções base mais NOSCORES.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZScanOptions {
    base: ScanOptions,
    no_scores: bool,
}

impl ZScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn match_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.base = self.base.match_pattern(pattern);
        self
    }

    #[must_use]
    pub fn count(mut self, count: u64) -> Self {
        self.base = self.base.count(count);
        self
    }

    /// Omite os scores da resposta.
    #[must_use]
    pub fn no_scores(mut self, no_scores: bool) -> Self {
        self.no_scores = no_scores;
        self
    }

    pub fn base(&self) -> &ScanOptions {
        &self.base
    }
}

impl ToArgs for ZScanOptions {
    fn to_args(&self) -> Result<Vec<String>, EncodingError> {
        let mut args = self.base.to_args()?;
        if self.no_scores {
            args.push(NOSCORES.to_string());
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scan_options() {
        assert!(ScanOptions::new().to_args().unwrap().is_empty());
        assert!(ZScanOptions::new().to_args().unwrap().is_empty());
    }

    #[test]
    fn base_match_and_count() {
        let opts = ScanOptions::new().count(50).match_pattern("user:*");
        assert_eq!(
            opts.to_args().unwrap(),
            vec!["MATCH", "user:*", "COUNT", "50"]
        );
    }

    #[test]
    fn zscan_appends_noscores_after_base() {
        let opts = ZScanOptions::new()
            .no_scores(true)
            .match_pattern("a*")
            .count(10);
        assert_eq!(
            opts.to_args().unwrap(),
            vec!["MATCH", "a*", "COUNT", "10", "NOSCORES"]
        );
        assert_eq!(opts.base(), &ScanOptions::new().match_pattern("a*").count(10));
    }

    #[test]
    fn noscores_can_be_cleared() {
        let opts = ZScanOptions::new().no_scores(true).no_scores(false);
        assert!(opts.to_args().unwrap().is_empty());
    }
}
