//! Reserved mode-selection flags.
//!
//! A dual-mode call carries at most one reserved flag. Affirmative flags
//! (`sync` by default) request synchronous execution when `true`; negative
//! flags (`asynchronous` by default) request it when `false`. Wrapped functions
//! may not declare parameters with any of these names, see
//! [`validate_wrapped_fn`](crate::signature::validate_wrapped_fn).

use std::collections::BTreeSet;
use std::fmt;

use crate::error::FlagError;

/// Affirmative flag: `sync = true` runs the call to completion.
pub const SYNC_FLAG: &str = "sync";

/// Negative flag: `asynchronous = true` returns a future.
pub const ASYNC_FLAG: &str = "asynchronous";

/// How a dual-mode call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Block the calling thread until the result is ready.
    Sync,
    /// Hand the caller a future to await.
    Async,
}

impl Mode {
    pub fn is_sync(self) -> bool {
        matches!(self, Mode::Sync)
    }

    fn from_sync(sync: bool) -> Self {
        if sync {
            Mode::Sync
        } else {
            Mode::Async
        }
    }
}

/// The set of parameter names reserved for mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedFlags {
    affirmative: BTreeSet<String>,
    negative: BTreeSet<String>,
}

impl Default for ReservedFlags {
    fn default() -> Self {
        Self::new([SYNC_FLAG], [ASYNC_FLAG])
    }
}

impl ReservedFlags {
    pub fn new<A, N>(affirmative: A, negative: N) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            affirmative: affirmative.into_iter().map(Into::into).collect(),
            negative: negative.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks that the set is usable: both polarities present, no name in both.
    pub fn validate(&self) -> Result<(), FlagError> {
        if self.affirmative.is_empty() || self.negative.is_empty() {
            return Err(FlagError::Incomplete);
        }

        if let Some(name) = self.affirmative.intersection(&self.negative).next() {
            return Err(FlagError::Ambiguous(name.clone()));
        }

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.affirmative.contains(name) || self.negative.contains(name)
    }

    /// All reserved names, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.affirmative
            .union(&self.negative)
            .map(String::as_str)
    }

    pub fn affirmative(&self) -> impl Iterator<Item = &str> {
        self.affirmative.iter().map(String::as_str)
    }

    pub fn negative(&self) -> impl Iterator<Item = &str> {
        self.negative.iter().map(String::as_str)
    }

    /// Translates one flag and its value into "should this call block?".
    pub fn should_run_sync(&self, flag: &str, value: bool) -> Result<bool, FlagError> {
        if self.affirmative.contains(flag) {
            Ok(value)
        } else if self.negative.contains(flag) {
            Ok(!value)
        } else {
            Err(FlagError::Unknown(flag.to_string()))
        }
    }

    /// Resolves the mode requested by a call's keyword flags.
    ///
    /// Names that are not reserved are ignored, they belong to the wrapped
    /// function. Returns `None` when no reserved flag was passed so the caller
    /// can fall back to its default mode.
    pub fn resolve<'a, I>(&self, flags: I) -> Result<Option<Mode>, FlagError>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let present: Vec<(&str, bool)> = flags
            .into_iter()
            .filter(|(name, _)| self.contains(name))
            .collect();

        match present.as_slice() {
            [] => Ok(None),
            [(name, value)] => self.should_run_sync(name, *value).map(Mode::from_sync).map(Some),
            many => Err(FlagError::Conflicting {
                given: many.iter().map(|(name, _)| name.to_string()).collect(),
                flags: self.clone(),
            }),
        }
    }
}

impl fmt::Display for ReservedFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = ReservedFlags::default();
        assert!(flags.contains("sync"));
        assert!(flags.contains("asynchronous"));
        assert!(!flags.contains("a"));
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec!["asynchronous", "sync"]);
        assert_eq!(flags.to_string(), "{asynchronous, sync}");
        assert!(flags.validate().is_ok());
    }

    #[test]
    fn test_should_run_sync_polarity() {
        let flags = ReservedFlags::default();
        assert!(flags.should_run_sync("sync", true).unwrap());
        assert!(!flags.should_run_sync("sync", false).unwrap());
        assert!(!flags.should_run_sync("asynchronous", true).unwrap());
        assert!(flags.should_run_sync("asynchronous", false).unwrap());
        assert_eq!(
            flags.should_run_sync("blocking", true),
            Err(FlagError::Unknown("blocking".to_string()))
        );
    }

    #[test]
    fn test_resolve_single_flag() {
        let flags = ReservedFlags::default();
        assert_eq!(flags.resolve([("sync", true)]).unwrap(), Some(Mode::Sync));
        assert_eq!(flags.resolve([("asynchronous", true)]).unwrap(), Some(Mode::Async));
        assert_eq!(flags.resolve([("asynchronous", false)]).unwrap(), Some(Mode::Sync));
    }

    #[test]
    fn test_resolve_ignores_unreserved_names() {
        let flags = ReservedFlags::default();
        assert_eq!(flags.resolve([("timeout", true)]).unwrap(), None);
        assert_eq!(flags.resolve(std::iter::empty::<(&str, bool)>()).unwrap(), None);
        assert_eq!(
            flags.resolve([("timeout", true), ("sync", false)]).unwrap(),
            Some(Mode::Async)
        );
    }

    #[test]
    fn test_resolve_rejects_multiple_flags() {
        let flags = ReservedFlags::default();
        let err = flags
            .resolve([("sync", true), ("asynchronous", false)])
            .unwrap_err();
        assert!(matches!(err, FlagError::Conflicting { ref given, .. } if given.len() == 2));
    }

    #[test]
    fn test_validate_rejects_bad_sets() {
        let ambiguous = ReservedFlags::new(["sync", "both"], ["both"]);
        assert_eq!(ambiguous.validate(), Err(FlagError::Ambiguous("both".to_string())));

        let incomplete = ReservedFlags::new(["sync"], Vec::<String>::new());
        assert_eq!(incomplete.validate(), Err(FlagError::Incomplete));
    }
}
