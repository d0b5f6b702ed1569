//! Type keys used to index providers, seeds, and resolved values.

use std::any::TypeId;
use std::fmt;

/// Identity of a dependency slot.
///
/// A key pairs the `TypeId` of the requested type with its type name. Only the
/// `TypeId` takes part in equality and hashing; the name is carried for error
/// messages and logs. Keys can be built for unsized types too, which is how
/// trait objects (`dyn Store`) become resolvable slots.
///
/// # Examples
///
/// ```rust
/// use tiered_di::Key;
///
/// trait Store: Send + Sync {}
///
/// let a = Key::of::<String>();
/// let b = Key::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.display_name(), "alloc::string::String");
///
/// let t = Key::of::<dyn Store>();
/// assert_ne!(a, t);
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Key for the type `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type name, as reported by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

// Hot path: TypeId-only comparison, the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shorthand for [`Key::of`].
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
