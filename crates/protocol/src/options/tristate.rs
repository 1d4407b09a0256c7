/// Flag de três estados para builders de opções.
///
/// O valor default é `Unset`, nunca `False`: uma flag não configurada
/// não gera token algum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    #[default]
    Unset,
    True,
    False,
}

impl TriState {
    pub fn is_set(self) -> bool {
        self != TriState::Unset
    }

    /// `None` se não configurada.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::Unset => None,
            TriState::True => Some(true),
            TriState::False => Some(false),
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }
}
