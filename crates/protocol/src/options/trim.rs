use stormstream_common::EncodingError;

use super::{APPROXIMATE, EXACT, LIMIT, MAXLEN, MINID, ToArgs};

/// Critério de trimming. Fixado na construção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMethod {
    /// Mantém no máximo N entradas.
    MaxLen,
    /// Descarta entradas com ID menor que o limiar.
    MinId,
}

impl TrimMethod {
    pub fn keyword(self) -> &'static str {
        match self {
            TrimMethod::MaxLen => MAXLEN,
            TrimMethod::MinId => MINID,
        }
    }
}

/// Precisão do trimming.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TrimExactness {
    /// Nenhum marcador é emitido; vale o default do servidor.
    #[default]
    Unset,
    Exact,
    Approximate,
}

/// Opções de trimming para XTRIM e XADD.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOptions {
    method: TrimMethod,
    threshold: String,
    exactness: TrimExactness,
    limit: u64,
}

impl TrimOptions {
    /// Trimming pelo tamanho máximo do stream.
    pub fn max_len(threshold: u64) -> Self {
        Self::new(TrimMethod::MaxLen, threshold.to_string())
    }

    /// Trimming pelo ID mínimo a manter.
    pub fn min_id(threshold: impl Into<String>) -> Self {
        Self::new(TrimMethod::MinId, threshold.into())
    }

    fn new(method: TrimMethod, threshold: String) -> Self {
        Self {
            method,
            threshold,
            exactness: TrimExactness::Unset,
            limit: 0,
        }
    }

    /// Trimming exato no limiar.
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.exactness = TrimExactness::Exact;
        self
    }

    /// Trimming aproximado, mais eficiente.
    #[must_use]
    pub fn approximate(mut self) -> Self {
        self.exactness = TrimExactness::Approximate;
        self
    }

    /// Trimming aproximado removendo no máximo `limit` entradas.
    #[must_use]
    pub fn approximate_with_limit(mut self, limit: u64) -> Self {
        self.exactness = TrimExactness::Approximate;
        self.limit = limit;
        self
    }

    pub fn method(&self) -> TrimMethod {
        self.method
    }

    pub fn threshold(&self) -> &str {
        &self.threshold
    }

    pub fn exactness(&self) -> TrimExactness {
        self.exactness
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl ToArgs for TrimOptions {
    fn to_args(&self) -> Result<Vec<String>, EncodingError> {
        let mut args = vec![self.method.keyword().to_string()];
        match self.exactness {
            TrimExactness::Exact => args.push(EXACT.to_string()),
            TrimExactness::Approximate => args.push(APPROXIMATE.to_string()),
            TrimExactness::Unset => {}
        }
        args.push(self.threshold.clone());
        // LIMIT só faz sentido com "~"; a combinação fica a cargo do chamador
        if self.limit > 0 {
            args.push(LIMIT.to_string());
            args.push(self.limit.to_string());
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn max_len_without_marker() {
        let args = TrimOptions::max_len(10).to_args().unwrap();
        assert_eq!(args, vec!["MAXLEN", "10"]);
    }

    #[test]
    fn min_id_exact() {
        let args = TrimOptions::min_id("1526919030474-0").exact().to_args().unwrap();
        assert_eq!(args, vec!["MINID", "=", "1526919030474-0"]);
    }

    #[test]
    fn approximate_with_limit() {
        let args = TrimOptions::max_len(1000)
            .approximate_with_limit(100)
            .to_args()
            .unwrap();
        assert_eq!(args, vec!["MAXLEN", "~", "1000", "LIMIT", "100"]);
    }

    #[test]
    fn zero_limit_is_omitted() {
        let opts = TrimOptions::min_id("5-0").approximate_with_limit(0);
        assert_eq!(opts.exactness(), TrimExactness::Approximate);
        assert_eq!(opts.to_args().unwrap(), vec!["MINID", "~", "5-0"]);
    }

    #[test]
    fn later_exactness_overrides_earlier() {
        let opts = TrimOptions::max_len(5).approximate().exact();
        assert_eq!(opts.to_args().unwrap(), vec!["MAXLEN", "=", "5"]);
    }

    proptest! {
        #[test]
        fn max_len_always_starts_with_keyword(threshold: u64, limit: u64) {
            let args = TrimOptions::max_len(threshold)
                .approximate_with_limit(limit)
                .to_args()
                .unwrap();
            prop_assert_eq!(args[0].as_str(), "MAXLEN");
        }

        #[test]
        fn min_id_always_starts_with_keyword(threshold in "[0-9]{1,13}-[0-9]{1,3}") {
            let args = TrimOptions::min_id(threshold).exact().to_args().unwrap();
            prop_assert_eq!(args[0].as_str(), "MINID");
        }

        #[test]
        fn limit_emitted_only_when_positive(threshold: u64, limit: u64) {
            let args = TrimOptions::max_len(threshold)
                .approximate_with_limit(limit)
                .to_args()
                .unwrap();
            if limit == 0 {
                prop_assert!(!args.iter().any(|a| a == "LIMIT"));
            } else {
                let n = args.len();
                prop_assert_eq!(&args[n - 2], "LIMIT");
                prop_assert_eq!(&args[n - 1], &limit.to_string());
            }
        }

        #[test]
        fn encoding_is_idempotent(threshold: u64, limit: u64) {
            let opts = TrimOptions::max_len(threshold).approximate_with_limit(limit);
            prop_assert_eq!(opts.to_args().unwrap(), opts.to_args().unwrap());
        }
    }
}
