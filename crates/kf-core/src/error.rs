use thiserror::Error;

pub type KfResult<T> = Result<T, KfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_context() {
        let err = KfError::IndexOob {
            what: "species",
            index: 7,
            len: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("species"));
        assert!(msg.contains("index=7"));
    }
}
