//! The flag/option registry: process-wide named toggles for optional
//! passes and verifier strictness.

use std::collections::HashMap;

/// A single flag's value: a bool, int, or free-form string.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// A boolean toggle.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A free-form string.
    Str(String),
}

impl FlagValue {
    /// This value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// This value as an int, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// This value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// The process-wide table of named flags controlling optional passes and
/// verifier strictness.
#[derive(Debug, Default)]
pub struct FlagRegistry {
    values: HashMap<String, FlagValue>,
}

impl FlagRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        FlagRegistry {
            values: HashMap::new(),
        }
    }

    /// A registry seeded with this crate's default flags: local
    /// optimization, jump threading, and Bad-propagation auditing all on,
    /// backend-phase verifier relaxations off.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.set("opt.local", FlagValue::Bool(true));
        reg.set("opt.jumpthreading", FlagValue::Bool(true));
        reg.set("verify.bad_audit", FlagValue::Bool(true));
        reg.set("verify.backend_phase", FlagValue::Bool(false));
        reg
    }

    /// Set (or overwrite) a flag's value.
    pub fn set(&mut self, name: impl Into<String>, value: FlagValue) {
        self.values.insert(name.into(), value);
    }

    /// Read a flag's value. Logs a warning and returns `None` for a name
    /// that was never set, rather than erroring: unknown-flag reads are a
    /// warning-level condition, not a hard failure.
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        let value = self.values.get(name);
        if value.is_none() {
            tracing::warn!(flag = name, "read of unknown flag");
        }
        value
    }

    /// Convenience accessor for a boolean flag, defaulting to `default` if
    /// unset or of the wrong type.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.values
            .get(name)
            .and_then(FlagValue::as_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_local_opt_and_jumpthreading() {
        let reg = FlagRegistry::with_defaults();
        assert!(reg.get_bool("opt.local", false));
        assert!(reg.get_bool("opt.jumpthreading", false));
        assert!(!reg.get_bool("verify.backend_phase", false));
    }

    #[test]
    fn unknown_flag_read_defaults_without_panic() {
        let reg = FlagRegistry::new();
        assert_eq!(reg.get_bool("nonexistent", true), true);
    }
}
