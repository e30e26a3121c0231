//! Compiled decode functions and the registry caching them.
//!
//! Each destination type describes how it is decoded by implementing
//! [`Decode::compile`], which returns a [`DecodeFn`]. A [`Registry`] compiles
//! the function for a type the first time it is requested and caches it by
//! [`TypeId`], so later decodes skip straight to the compiled strategy.
//!
//! Container types decode their elements with the functions of other types.
//! In lazy mode (the default) these are resolved from the registry when a
//! container is decoded. In eager mode they are compiled up front and captured
//! by the container's function. Both modes decode identically.

use core::{
    any::{Any, TypeId, type_name},
    marker::PhantomData,
};
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use either::Either::{self, Left, Right};
use parking_lot::RwLock;

use crate::{Decoder, Result, TypeTag};

/// A type that can be decoded from a token stream.
///
/// The [`Default`] value is the type's zero representation, which a nil token
/// decodes to.
///
/// Implementations for structs are usually derived with
/// [`Decode`](macro@crate::Decode).
pub trait Decode: Default + 'static {
    /// Build the decode function for this type.
    ///
    /// Usually called once per registry; the result is cached.
    fn compile(c: &mut Compiler<'_>) -> DecodeFn<Self>;
}

type Strategy<T> = dyn Fn(&mut Decoder<'_>, &mut T) -> Result<TypeTag> + Send + Sync;

/// A compiled strategy decoding one value into a `T`.
///
/// Returns the tag that was observed, which is [`TypeTag::Nil`] when the
/// destination was reset by a nil token.
pub struct DecodeFn<T>(Arc<Strategy<T>>);

impl<T> Clone for DecodeFn<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: 'static> DecodeFn<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Decoder<'_>, &mut T) -> Result<TypeTag> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A function failing on every call, for types with no decode strategy.
    pub fn unsupported() -> Self {
        Self::new(|_, _| {
            Err(crate::Error::Unsupported {
                type_name: type_name::<T>(),
            })
        })
    }

    pub(crate) fn call(&self, d: &mut Decoder<'_>, to: &mut T) -> Result<TypeTag> {
        (self.0)(d, to)
    }
}

/// Registry configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Compile the functions of nested types when compiling a container,
    /// rather than when the container is first decoded.
    pub eager: bool,
}

/// A cache of compiled decode functions, keyed by destination type.
///
/// Safe to share between threads; each type is compiled once.
#[derive(Default)]
pub struct Registry {
    options: Options,
    cache: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Registry {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            cache: RwLock::default(),
        }
    }

    /// The process-wide lazy registry used by default.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::default)
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// The decode function for `T`, compiling it on first use.
    pub fn resolve<T: Decode>(&self) -> DecodeFn<T> {
        match self.lookup::<T>() {
            Some(f) => f,
            None => Compiler::new(self).compile::<T>(),
        }
    }

    /// Whether a function for `T` has been compiled.
    pub fn contains<T: Decode>(&self) -> bool {
        self.cache.read().contains_key(&TypeId::of::<T>())
    }

    /// The number of compiled functions.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T: 'static>(&self) -> Option<DecodeFn<T>> {
        let cache = self.cache.read();
        let f = cache.get(&TypeId::of::<T>())?.downcast_ref::<DecodeFn<T>>().cloned();
        f
    }

    /// Store `f` unless another thread got there first, returning the winner.
    fn insert<T: 'static>(&self, f: DecodeFn<T>) -> DecodeFn<T> {
        let mut cache = self.cache.write();
        let entry = cache
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(f.clone()) as Arc<dyn Any + Send + Sync>);

        let winner = entry.downcast_ref::<DecodeFn<T>>().cloned();
        winner.unwrap_or(f)
    }
}

/// Builds decode functions on behalf of a [`Registry`].
pub struct Compiler<'r> {
    registry: &'r Registry,
    /// Types being compiled, to break cycles through recursive types.
    building: Vec<TypeId>,
}

impl<'r> Compiler<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            building: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Compile (or fetch) the decode function for `T`.
    pub fn compile<T: Decode>(&mut self) -> DecodeFn<T> {
        if let Some(f) = self.registry.lookup::<T>() {
            return f;
        }

        let id = TypeId::of::<T>();

        if self.building.contains(&id) {
            // Defer to the registry once the outer compilation has finished.
            return DecodeFn::new(|d, to: &mut T| d.registry().resolve::<T>().call(d, to));
        }

        self.building.push(id);
        let f = T::compile(self);
        self.building.pop();

        log::trace!("compiled decode function for {}", type_name::<T>());

        self.registry.insert(f)
    }

    /// Prepare the decode function of a type nested in the one being compiled.
    pub fn nested<U: Decode>(&mut self) -> Nested<U> {
        Nested(if self.registry.options.eager {
            Left(self.compile::<U>())
        } else {
            Right(PhantomData)
        })
    }
}

/// The decode function of a nested type, compiled or resolved on demand.
pub struct Nested<U>(Either<DecodeFn<U>, PhantomData<fn() -> U>>);

impl<U: Decode> Nested<U> {
    pub fn get(&self, d: &Decoder<'_>) -> DecodeFn<U> {
        self.0
            .as_ref()
            .either(DecodeFn::clone, |_| d.registry().resolve::<U>())
    }
}
