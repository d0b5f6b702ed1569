//! Signatures: what an injected operation asks for.
//!
//! The resolver never calls the operation being injected. It only reads its
//! [`Signature`], an ordered list of named parameters, and hands back a
//! [`Resolved`](crate::Resolved) map with one value per injected parameter.

use crate::key::Key;

/// How a parameter takes part in injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Must resolve, or the whole call fails.
    Required(Key),
    /// Omitted from the result when no provider or seed exists for it.
    Optional(Key),
    /// Carries no type: never injected.
    Untyped,
}

/// One named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

impl Param {
    /// The key to resolve, or `None` for untyped parameters.
    pub fn key(&self) -> Option<Key> {
        match self.kind {
            ParamKind::Required(key) | ParamKind::Optional(key) => Some(key),
            ParamKind::Untyped => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, ParamKind::Optional(_))
    }
}

/// An ordered list of parameters.
///
/// # Examples
///
/// ```
/// use tiered_di::{Key, Signature};
///
/// struct Database;
/// struct Cache;
///
/// let signature = Signature::new()
///     .param::<Database>("db")
///     .optional::<Cache>("cache")
///     .untyped("request");
///
/// let injected: Vec<_> = signature.injected().map(|p| p.name.as_str()).collect();
/// assert_eq!(injected, ["db", "cache"]);
/// assert_eq!(signature.params()[0].key(), Some(Key::of::<Database>()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required parameter of type `T`.
    pub fn param<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Required(Key::of::<T>()))
    }

    /// Adds a parameter of type `T` that is left out when nothing provides it.
    pub fn optional<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Optional(Key::of::<T>()))
    }

    /// Adds a parameter with no type. It is never injected.
    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Untyped)
    }

    fn push(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Parameters with a type, in declaration order.
    pub fn injected(&self) -> impl Iterator<Item = &Param> + '_ {
        self.params.iter().filter(|p| p.key().is_some())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Anything the resolver can inject into.
///
/// Implement it for handler types, or pass a [`Signature`] directly.
///
/// ```
/// use tiered_di::{Injectable, Signature, signature};
///
/// struct Config;
/// struct Database;
///
/// struct ListUsers;
///
/// impl Injectable for ListUsers {
///     fn signature(&self) -> Signature {
///         signature!(config: Config, db: Database)
///     }
/// }
///
/// assert_eq!(ListUsers.signature().len(), 2);
/// ```
pub trait Injectable {
    fn signature(&self) -> Signature;
}

impl Injectable for Signature {
    fn signature(&self) -> Signature {
        self.clone()
    }
}

impl<T: Injectable + ?Sized> Injectable for &T {
    fn signature(&self) -> Signature {
        (**self).signature()
    }
}

/// Builds a [`Signature`] of required parameters.
///
/// `name: Type` adds a required parameter, `name?: Type` an optional one, and
/// a bare `name` an untyped one.
///
/// ```
/// use tiered_di::signature;
///
/// trait Store: Send + Sync {}
/// struct Config;
///
/// let sig = signature!(config: Config, store?: dyn Store, raw);
/// assert_eq!(sig.len(), 3);
/// assert!(sig.params()[1].is_optional());
/// assert_eq!(sig.injected().count(), 2);
/// ```
#[macro_export]
macro_rules! signature {
    (@acc $sig:expr ;) => { $sig };
    (@acc $sig:expr ; $name:ident ?: $ty:ty $(, $($rest:tt)*)?) => {
        $crate::signature!(@acc $sig.optional::<$ty>(stringify!($name)) ; $($($rest)*)?)
    };
    (@acc $sig:expr ; $name:ident : $ty:ty $(, $($rest:tt)*)?) => {
        $crate::signature!(@acc $sig.param::<$ty>(stringify!($name)) ; $($($rest)*)?)
    };
    (@acc $sig:expr ; $name:ident $(, $($rest:tt)*)?) => {
        $crate::signature!(@acc $sig.untyped(stringify!($name)) ; $($($rest)*)?)
    };
    ($($body:tt)*) => {
        $crate::signature!(@acc $crate::Signature::new() ; $($body)*)
    };
}
