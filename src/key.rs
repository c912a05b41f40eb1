//! Type tags and structural lookup keys.
//!
//! Every provider in a container is filed under one or more [`Key`]s. A key
//! is made of three parts: the registration name, the type being asked for,
//! and the types of the user-provided arguments. Registration fans a
//! component out over every type it can be viewed as, while resolution
//! fans a request out over every type each argument can be viewed as, so
//! that a request with a derived argument still finds a constructor that
//! accepts its base.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::arg::Arg;
use crate::descriptors::TypeInfo;

/// Runtime identity of a (possibly unsized) type.
///
/// Equality and hashing only look at the [`TypeId`]; the name is kept for
/// diagnostics.
///
/// ```rust
/// use autowire::TypeTag;
///
/// trait Greeter {}
///
/// let tag = TypeTag::of::<dyn Greeter>();
/// assert_eq!(tag, TypeTag::of::<dyn Greeter>());
/// assert_ne!(tag, TypeTag::of::<String>());
/// assert!(tag.name().contains("Greeter"));
/// ```
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) type ArgTags = SmallVec<[TypeTag; 4]>;

/// Lookup key for providers.
///
/// Two keys are equal exactly when their names, types and argument type
/// sequences are equal. The empty name and "no name" are the same thing.
///
/// ```rust
/// use autowire::{Key, TypeTag};
///
/// let a = Key::new("", TypeTag::of::<String>(), [TypeTag::of::<u32>()]);
/// let b = Key::new("", TypeTag::of::<String>(), [TypeTag::of::<u32>()]);
/// let c = Key::new("other", TypeTag::of::<String>(), [TypeTag::of::<u32>()]);
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.arg_tags().len(), 1);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    name: Option<Arc<str>>,
    ty: TypeTag,
    args: ArgTags,
}

impl Key {
    /// Builds a key from its parts.
    pub fn new(name: &str, ty: TypeTag, args: impl IntoIterator<Item = TypeTag>) -> Self {
        Self {
            name: if name.is_empty() { None } else { Some(Arc::from(name)) },
            ty,
            args: args.into_iter().collect(),
        }
    }

    /// A key without argument types.
    pub fn simple(name: &str, ty: TypeTag) -> Self {
        Self::new(name, ty, [])
    }

    /// Registration name, empty when unnamed.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// The requested or registered type.
    pub fn type_tag(&self) -> TypeTag {
        self.ty
    }

    /// Types of the user-provided arguments, in order.
    pub fn arg_tags(&self) -> &[TypeTag] {
        &self.args
    }

    fn with_args(&self, args: &ArgTags) -> Self {
        Self {
            name: self.name.clone(),
            ty: self.ty,
            args: args.clone(),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}[{}]", self.ty.name(), name)?;
        } else {
            f.write_str(self.ty.name())?;
        }
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(arg.name())?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// The key a request is first looked up under.
///
/// Arguments contribute their own runtime type; a typed null contributes
/// the type it was declared with.
pub fn compute_key(name: &str, ty: TypeTag, args: &[Arg]) -> Key {
    Key::new(name, ty, args.iter().map(Arg::type_tag))
}

/// Every key a constructor is filed under: the component itself, then each
/// base, then each interface, all sharing the same argument shape.
pub(crate) fn registration_keys(name: &str, info: &TypeInfo, user_params: &[TypeTag]) -> Vec<Key> {
    let mut keys: Vec<Key> = Vec::new();
    for tag in info.ancestry() {
        let key = Key::new(name, tag, user_params.iter().copied());
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Ancestry of every argument, in order. Two requests with the same simple
/// key and the same shape expand to the same lookup keys.
pub(crate) type ArgShape = SmallVec<[ArgTags; 2]>;

pub(crate) fn arg_shape(args: &[Arg]) -> ArgShape {
    args.iter().map(Arg::ancestry).collect()
}

/// Expands a request into every key a matching constructor could have been
/// filed under.
///
/// The expansion is a cartesian product over the arguments: for each
/// argument, its exact type first, then its bases, then its interfaces.
/// The result therefore starts with the exact key.
pub(crate) fn lookup_keys(simple: &Key, shape: &[ArgTags]) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut current = ArgTags::new();
    expand(simple, shape, &mut current, &mut keys);
    keys
}

fn expand(simple: &Key, rest: &[ArgTags], current: &mut ArgTags, keys: &mut Vec<Key>) {
    match rest.split_first() {
        None => keys.push(simple.with_args(current)),
        Some((first, tail)) => {
            for &tag in first {
                current.push(tag);
                expand(simple, tail, current, keys);
                current.pop();
            }
        }
    }
}
