//! Type identity used by the registry, the cache and the resolver.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type id plus type name.
///
/// Equality and hashing only look at the `TypeId`; the name is carried for
/// diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Identity of `T`, which may be a `dyn Trait`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shape of a required type.
///
/// Every dependency request is one of these:
///
/// - **Concrete**: a registered component, handed out by value (`Value<T>`)
///   or as the component itself when loaded
/// - **Pointer**: a shared handle to a concrete component (`Arc<T>`)
/// - **Interface**: a shared handle to whichever component is bound to a
///   trait (`Arc<dyn Trait>`)
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Key, TypeInfo};
///
/// let key = Key::Pointer(TypeInfo::of::<String>());
/// assert_eq!(key.kind(), "pointer");
/// assert_eq!(key.display_name(), "alloc::string::String");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Concrete(TypeInfo),
    Pointer(TypeInfo),
    Interface(TypeInfo),
}

impl Key {
    /// The target type, without the pointer or interface wrapper.
    pub fn type_info(&self) -> TypeInfo {
        match self {
            Key::Concrete(info) | Key::Pointer(info) | Key::Interface(info) => *info,
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.type_info().name()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Key::Concrete(_) => "concrete",
            Key::Pointer(_) => "pointer",
            Key::Interface(_) => "interface",
        }
    }

    /// Pointer form of a concrete key; other shapes are unchanged.
    pub fn as_pointer(self) -> Key {
        match self {
            Key::Concrete(info) => Key::Pointer(info),
            other => other,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.kind())
    }
}
