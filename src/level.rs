//! Scope levels.

use std::fmt;

/// An integer tier that decides where a provider's single instance lives.
///
/// Level 1 is the root: values provided there live as long as the resolver.
/// Every child scope sits one level above its parent, so a request scope is
/// usually level 2 and anything nested inside it level 3 and up. Dependencies
/// may only flow downwards: a provider can depend on providers at its own level
/// or below, never above.
///
/// Levels are plain integers. Applications that prefer named tiers can define
/// their own enum and convert through `u32`:
///
/// ```rust
/// use tiered_di::Level;
///
/// #[repr(u32)]
/// enum Stage {
///     App = 1,
///     Request = 2,
/// }
///
/// assert_eq!(Level::from(Stage::App as u32), Level::ROOT);
/// assert_eq!(Level::from(Stage::Request as u32), Level::ROOT.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct Level(u32);

impl Level {
    /// The root level.
    pub const ROOT: Level = Level(1);

    /// Raw level number.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The level directly above this one.
    pub fn next(self) -> Level {
        Level(self.0.saturating_add(1))
    }

    /// Levels start at 1; zero is rejected at registration.
    pub fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::ROOT
    }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self {
        Level(value)
    }
}

impl From<Level> for u32 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_one_and_default() {
        assert_eq!(Level::ROOT.get(), 1);
        assert_eq!(Level::default(), Level::ROOT);
        assert!(Level::ROOT.is_valid());
        assert!(!Level::from(0).is_valid());
    }

    #[test]
    fn next_and_ordering() {
        let two = Level::ROOT.next();
        assert_eq!(two.get(), 2);
        assert!(Level::ROOT < two);
        assert_eq!(Level::from(u32::MAX).next().get(), u32::MAX);
    }
}
