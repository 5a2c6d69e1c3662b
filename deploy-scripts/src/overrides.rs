//! Constructor overrides and the placeholder interpreter that resolves them.
//!
//! The override file maps a contract name to an argument array. Each element is
//! parsed into an [`OverrideToken`] up front, so a malformed file is rejected as a
//! whole before any transaction is sent. Tokens are evaluated against a
//! [`ResolutionContext`] once the contract's turn comes:
//!
//! - `"$Name"` evaluates to the address deployed for `Name`, in this run or a prior one
//! - `"123"` / `"123n"` evaluate to an arbitrary-precision unsigned integer
//! - every other JSON scalar is passed through as a literal

use std::{collections::HashMap, fs, path::Path, str::FromStr};

use alloy::primitives::{Address, I256, U256};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    constants::{BIG_INT_SUFFIX, PLACEHOLDER_PREFIX},
    errors::DeployError,
    types::ArgValue,
};

// ------------------------------
// | Address Resolution Context |
// ------------------------------

/// The addresses known to a run, used to resolve constructor dependencies
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Addresses produced by this run; `None` marks a contract skipped with no known address
    deployed: HashMap<String, Option<Address>>,
    /// Addresses recorded by the previous run on the same network
    previous: HashMap<String, Address>,
}

impl ResolutionContext {
    /// A context seeded with the previous run's addresses
    pub fn new(previous: HashMap<String, Address>) -> Self {
        Self {
            deployed: HashMap::new(),
            previous,
        }
    }

    /// The address of `name`, preferring this run's deployment over the previous run's
    pub fn get_address(&self, name: &str) -> Result<Address, DeployError> {
        self.deployed
            .get(name)
            .copied()
            .flatten()
            .or_else(|| self.previous(name))
            .ok_or_else(|| DeployError::DependencyUnresolved(name.to_string()))
    }

    /// The address recorded for `name` by the previous run
    pub fn previous(&self, name: &str) -> Option<Address> {
        self.previous.get(name).copied()
    }

    /// Record the outcome of `name` in this run
    pub fn record(&mut self, name: &str, address: Option<Address>) {
        self.deployed.insert(name.to_string(), address);
    }

    /// Evaluate a sequence of override tokens into constructor arguments
    pub fn resolve_tokens(&self, tokens: &[OverrideToken]) -> Result<Vec<ArgValue>, DeployError> {
        tokens.iter().map(|token| token.evaluate(self)).collect()
    }
}

// -------------------
// | Override Tokens |
// -------------------

/// A single parsed element of an override argument array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideToken {
    /// A reference to the address of a deployed contract
    Placeholder(String),
    /// A value used as-is
    Literal(ArgValue),
}

impl OverrideToken {
    /// Parse a JSON value from the override file into a token
    pub fn parse(value: &Value) -> Result<Self, DeployError> {
        match value {
            Value::String(s) => Self::parse_str(s),
            Value::Bool(b) => Ok(OverrideToken::Literal(ArgValue::Bool(*b))),
            Value::Number(n) => {
                if let Some(unsigned) = n.as_u64() {
                    Ok(OverrideToken::Literal(ArgValue::Uint(U256::from(unsigned))))
                } else if let Some(signed) = n.as_i64() {
                    I256::from_dec_str(&signed.to_string())
                        .map(|v| OverrideToken::Literal(ArgValue::Int(v)))
                        .map_err(|e| DeployError::MalformedOverrideFile(e.to_string()))
                } else {
                    Err(DeployError::MalformedOverrideFile(format!(
                        "non-integer number {} in override",
                        n
                    )))
                }
            }
            other => Err(DeployError::MalformedOverrideFile(format!(
                "unsupported override value {}",
                other
            ))),
        }
    }

    /// Parse a string token: a placeholder, an integer literal, or a plain string
    fn parse_str(s: &str) -> Result<Self, DeployError> {
        if let Some(name) = s.strip_prefix(PLACEHOLDER_PREFIX) {
            if name.is_empty() {
                return Err(DeployError::MalformedOverrideFile(
                    "placeholder without a contract name".to_string(),
                ));
            }
            return Ok(OverrideToken::Placeholder(name.to_string()));
        }

        let digits = s.strip_suffix(BIG_INT_SUFFIX).unwrap_or(s);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return U256::from_str_radix(digits, 10)
                .map(|v| OverrideToken::Literal(ArgValue::Uint(v)))
                .map_err(|e| DeployError::MalformedOverrideFile(format!("{s}: {e}")));
        }

        Ok(OverrideToken::Literal(ArgValue::Str(s.to_string())))
    }

    /// Evaluate the token against the addresses known so far
    pub fn evaluate(&self, ctx: &ResolutionContext) -> Result<ArgValue, DeployError> {
        match self {
            OverrideToken::Placeholder(name) => ctx.get_address(name).map(ArgValue::Address),
            OverrideToken::Literal(value) => Ok(value.clone()),
        }
    }
}

// -----------------
// | Override File |
// -----------------

/// Constructor argument overrides, keyed by contract name
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// The parsed token arrays
    entries: HashMap<String, Vec<OverrideToken>>,
}

impl Overrides {
    /// Parse the contents of an override file
    pub fn parse(contents: &str) -> Result<Self, DeployError> {
        let raw: HashMap<String, Vec<Value>> = serde_json::from_str(contents)
            .map_err(|e| DeployError::MalformedOverrideFile(e.to_string()))?;

        let entries = raw
            .into_iter()
            .map(|(name, values)| {
                let tokens = values
                    .iter()
                    .map(OverrideToken::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, DeployError>((name, tokens))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { entries })
    }

    /// Load the override file at `path`.
    ///
    /// A missing file yields no overrides; an unreadable or malformed one is
    /// logged and likewise ignored.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| DeployError::MalformedOverrideFile(e.to_string()))
            .and_then(|contents| Self::parse(&contents));

        match parsed {
            Ok(overrides) => {
                info!("Loaded constructor overrides from {}", path.display());
                overrides
            }
            Err(e) => {
                warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// The override tokens for `name`, if any
    pub fn get(&self, name: &str) -> Option<&[OverrideToken]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}

impl FromStr for Overrides {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy::primitives::address;
    use serde_json::json;

    use super::*;

    const FOO: Address = address!("0xabc0000000000000000000000000000000000001");

    #[test]
    fn test_placeholder_and_bigint_resolution() {
        let overrides: Overrides = r#"{ "Bar": ["$Foo", "123n"] }"#.parse().unwrap();
        let mut ctx = ResolutionContext::default();
        ctx.record("Foo", Some(FOO));

        let args = ctx.resolve_tokens(overrides.get("Bar").unwrap()).unwrap();
        let expected = vec![ArgValue::Address(FOO), ArgValue::Uint(U256::from(123u64))];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_placeholder_falls_back_to_previous_run() {
        let ctx = ResolutionContext::new(HashMap::from([("Foo".to_string(), FOO)]));
        let token = OverrideToken::parse(&json!("$Foo")).unwrap();
        assert_eq!(token.evaluate(&ctx).unwrap(), ArgValue::Address(FOO));
    }

    #[test]
    fn test_in_run_address_shadows_previous() {
        let newer = address!("0xabc0000000000000000000000000000000000002");
        let mut ctx = ResolutionContext::new(HashMap::from([("Foo".to_string(), FOO)]));
        ctx.record("Foo", Some(newer));
        assert_eq!(ctx.get_address("Foo").unwrap(), newer);
    }

    #[test]
    fn test_skipped_without_address_uses_previous_or_fails() {
        let mut ctx = ResolutionContext::default();
        ctx.record("Foo", None);
        let expected = Err(DeployError::DependencyUnresolved("Foo".into()));
        assert_eq!(ctx.get_address("Foo"), expected);
    }

    #[test]
    fn test_unknown_placeholder_is_unresolved() {
        let ctx = ResolutionContext::default();
        let token = OverrideToken::parse(&json!("$Missing")).unwrap();
        let expected = Err(DeployError::DependencyUnresolved("Missing".into()));
        assert_eq!(token.evaluate(&ctx), expected);
    }

    #[test]
    fn test_literal_tokens() {
        assert_eq!(
            OverrideToken::parse(&json!("42")).unwrap(),
            OverrideToken::Literal(ArgValue::Uint(U256::from(42u64)))
        );
        assert_eq!(
            OverrideToken::parse(&json!("Pat")).unwrap(),
            OverrideToken::Literal(ArgValue::Str("Pat".into()))
        );
        assert_eq!(
            OverrideToken::parse(&json!("12a3n")).unwrap(),
            OverrideToken::Literal(ArgValue::Str("12a3n".into()))
        );
        assert_eq!(
            OverrideToken::parse(&json!(-5)).unwrap(),
            OverrideToken::Literal(ArgValue::Int(I256::from_dec_str("-5").unwrap()))
        );
        assert_eq!(
            OverrideToken::parse(&json!(true)).unwrap(),
            OverrideToken::Literal(ArgValue::Bool(true))
        );
    }

    #[test]
    fn test_bigint_beyond_u64() {
        let value = json!("340282366920938463463374607431768211456n");
        let token = OverrideToken::parse(&value).unwrap();
        let expected = U256::from(1u64) << 128usize;
        assert_eq!(token, OverrideToken::Literal(ArgValue::Uint(expected)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(OverrideToken::parse(&json!("$")).is_err());
        assert!(OverrideToken::parse(&json!(1.5)).is_err());
        assert!(OverrideToken::parse(&json!(null)).is_err());
        assert!(Overrides::parse(r#"{ "Foo": [[1, 2]] }"#).is_err());
        assert!(Overrides::parse(r#"["not", "a", "map"]"#).is_err());
    }

    #[test]
    fn test_load_malformed_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ this is not json").unwrap();

        let overrides = Overrides::load(file.path());
        assert!(overrides.get("Foo").is_none());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides::load(&dir.path().join("deploy-config.json"));
        assert!(overrides.get("Foo").is_none());
    }
}
