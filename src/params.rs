//! External parameter buffer access.
//!
//! Query parameters arrive in a buffer owned by the execution engine; the
//! codecs only need to fetch a raw slot by parameter id and hand it to
//! `datum_ref`. The trait keeps the core testable without a live engine.

pub trait ParamBuffer: Send + Sync {
    /// Raw row-format bytes of the parameter, or `None` for SQL NULL and
    /// for parameter ids the buffer does not hold.
    fn param(&self, param_id: u32) -> Option<&[u8]>;
}

/// A simple owned parameter buffer, mainly for callers that assemble
/// parameters on the host side (and for tests).
#[derive(Debug, Default)]
pub struct OwnedParams {
    slots: Vec<Option<Vec<u8>>>,
}

impl OwnedParams {
    pub fn new() -> Self {
        OwnedParams { slots: Vec::new() }
    }

    /// Append a parameter value; returns its parameter id.
    pub fn push(&mut self, bytes: Vec<u8>) -> u32 {
        self.slots.push(Some(bytes));
        (self.slots.len() - 1) as u32
    }

    /// Append a SQL NULL parameter; returns its parameter id.
    pub fn push_null(&mut self) -> u32 {
        self.slots.push(None);
        (self.slots.len() - 1) as u32
    }
}

impl ParamBuffer for OwnedParams {
    fn param(&self, param_id: u32) -> Option<&[u8]> {
        self.slots
            .get(param_id as usize)
            .and_then(|slot| slot.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_and_nulls() {
        let mut params = OwnedParams::new();
        let a = params.push(vec![1, 2, 3]);
        let b = params.push_null();
        assert_eq!(params.param(a), Some(&[1u8, 2, 3][..]));
        assert_eq!(params.param(b), None);
        assert_eq!(params.param(99), None);
    }
}
