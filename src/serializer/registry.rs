//! Type Registry Module
//!
//! Maps embedded type discriminators back to Rust types without reflection.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::FormatError;
use crate::serializer::Cacheable;

// == Type Registry ==
/// Set of types a serializer is allowed to decode.
///
/// A discriminator that is not registered here is treated as a type that
/// does not exist in the current process.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, TypeId>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with strings, booleans and numbers.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry
            .register::<String>()
            .register::<bool>()
            .register::<char>()
            .register::<i32>()
            .register::<i64>()
            .register::<u32>()
            .register::<u64>()
            .register::<f64>();
        registry
    }

    /// Registers `T` under its discriminator.
    pub fn register<T: Cacheable>(&mut self) -> &mut Self {
        self.types.insert(T::type_name(), TypeId::of::<T>());
        self
    }

    /// Resolves a discriminator to the registered type.
    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    /// Returns true if `T` has been registered.
    pub fn contains<T: Cacheable>(&self) -> bool {
        self.resolve(T::type_name()) == Some(TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Checks that `found` names the type `T` the caller wants to decode.
    pub(crate) fn check<T: Cacheable>(&self, found: &str) -> Result<(), FormatError> {
        match self.resolve(found) {
            None => Err(FormatError::UnknownType(found.to_string())),
            Some(id) if id == TypeId::of::<T>() => Ok(()),
            Some(_) => Err(FormatError::TypeMismatch {
                expected: T::type_name().to_string(),
                found: found.to_string(),
            }),
        }
    }
}
