// ABOUTME: Named service registry with lifetime management and explicit request scoping
// ABOUTME: Resolves registrations to live instances, constructing dependencies recursively
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Service Container
//!
//! A registry mapping a symbolic name to a definition plus a declared
//! lifetime. Resolving a name constructs the instance (and its dependencies,
//! recursively) and caches it according to the lifetime:
//!
//! - [`Lifetime::Transient`]: a new instance on every resolution
//! - [`Lifetime::Scoped`]: one instance per [`Scope`], created lazily
//! - [`Lifetime::Singleton`]: one instance per process, created lazily
//!
//! Resolving by name rather than by type keeps the seam open for swapping an
//! implementation with a test double: re-registering a name replaces the
//! previous definition (last write wins).
//!
//! Request scoping is explicit: every resolution call takes a [`Scope`]
//! value, created per request by the middleware stack. Two concurrent
//! requests hold distinct scopes and never observe each other's scoped
//! instances.
//!
//! Definitions come in two tagged variants rather than any runtime
//! inspection of the callable:
//!
//! - **Factory**: a closure receiving a [`Resolver`], pulling whatever
//!   dependencies it needs by name
//! - **Constructor**: a closure receiving its declared dependency names,
//!   resolved in order, as a slice of instances
//!
//! Cycles among registrations are detected during resolution and fail with
//! a typed error instead of recursing unboundedly.

use crate::errors::{AppError, AppResult};
use dashmap::DashMap;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A resolved service instance, type-erased for heterogeneous storage
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

type FactoryFn = dyn Fn(&Resolver<'_>) -> AppResult<ServiceInstance> + Send + Sync;
type ConstructorFn = dyn Fn(&[ServiceInstance]) -> AppResult<ServiceInstance> + Send + Sync;

/// Instance lifetime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// A new instance per resolution call
    Transient,
    /// One instance per request scope
    Scoped,
    /// One instance for the life of the process
    Singleton,
}

/// Tagged service definition
pub enum Definition {
    /// Resolver-style factory: pulls its own dependencies by name
    Factory(Box<FactoryFn>),
    /// Constructor with ordered dependency names, resolved before invocation
    Constructor {
        dependencies: Vec<String>,
        build: Box<ConstructorFn>,
    },
}

struct Registration {
    definition: Definition,
    lifetime: Lifetime,
}

/// Per-request resolution context.
///
/// Cheap to clone; clones share the same scoped-instance cache. Dropping the
/// last clone drops every scoped instance with it.
#[derive(Clone)]
pub struct Scope {
    id: Uuid,
    instances: Arc<DashMap<String, ServiceInstance>>,
}

impl Scope {
    /// Create a fresh, empty scope
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            instances: Arc::new(DashMap::new()),
        }
    }

    /// Scope identifier, used for request correlation in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("instances", &self.instances.len())
            .finish()
    }
}

/// Resolution handle passed to factory definitions.
///
/// Carries the in-flight resolution chain so cycles threading through a
/// factory are still detected.
pub struct Resolver<'a> {
    container: &'a Container,
    scope: &'a Scope,
    stack: RefCell<Vec<String>>,
}

impl Resolver<'_> {
    /// Resolve a dependency by name from inside a factory
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unregistered, the chain cycles, or
    /// construction fails.
    pub fn resolve(&self, name: &str) -> AppResult<ServiceInstance> {
        let mut stack = self.stack.borrow_mut();
        self.container.resolve_with_stack(name, self.scope, &mut stack)
    }

    /// Resolve a dependency and downcast it to a concrete type
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the instance is not a `T`.
    pub fn resolve_as<T: Send + Sync + 'static>(&self, name: &str) -> AppResult<Arc<T>> {
        downcast_instance(self.resolve(name)?, name)
    }

    /// The scope this resolution runs under
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        self.scope
    }
}

/// Named service registry with lifetime management
pub struct Container {
    registry: RwLock<HashMap<String, Arc<Registration>>>,
    singletons: DashMap<String, ServiceInstance>,
}

impl Container {
    /// Create an empty container
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            singletons: DashMap::new(),
        }
    }

    /// Register a definition under a name. Last write wins.
    pub fn register(&self, name: impl Into<String>, definition: Definition, lifetime: Lifetime) {
        let name = name.into();
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if registry
            .insert(
                name.clone(),
                Arc::new(Registration {
                    definition,
                    lifetime,
                }),
            )
            .is_some()
        {
            tracing::debug!(service = %name, "service registration replaced");
        }
    }

    /// Register a resolver-style factory producing a `T`
    pub fn register_factory<T, F>(&self, name: impl Into<String>, lifetime: Lifetime, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> AppResult<T> + Send + Sync + 'static,
    {
        self.register(
            name,
            Definition::Factory(Box::new(move |resolver| {
                factory(resolver).map(|value| Arc::new(value) as ServiceInstance)
            })),
            lifetime,
        );
    }

    /// Register a constructor with ordered dependency names producing a `T`
    pub fn register_constructor<T, F>(
        &self,
        name: impl Into<String>,
        dependencies: &[&str],
        lifetime: Lifetime,
        build: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn(&[ServiceInstance]) -> AppResult<T> + Send + Sync + 'static,
    {
        self.register(
            name,
            Definition::Constructor {
                dependencies: dependencies.iter().map(|&d| d.to_owned()).collect(),
                build: Box::new(move |deps| {
                    build(deps).map(|value| Arc::new(value) as ServiceInstance)
                }),
            },
            lifetime,
        );
    }

    /// Register an already-built value as a singleton
    pub fn register_instance<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: T) {
        let instance: ServiceInstance = Arc::new(value);
        self.register(
            name,
            Definition::Factory(Box::new(move |_| Ok(instance.clone()))),
            Lifetime::Singleton,
        );
    }

    /// Resolve a name to a live instance under the given scope
    ///
    /// # Errors
    ///
    /// Returns `SERVICE_NOT_FOUND` for unregistered names and
    /// `DEPENDENCY_CYCLE` when registrations form a cycle.
    pub fn resolve(&self, name: &str, scope: &Scope) -> AppResult<ServiceInstance> {
        let mut stack = Vec::new();
        self.resolve_with_stack(name, scope, &mut stack)
    }

    /// Resolve a name and downcast the instance to a concrete type
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the instance is not a `T`.
    pub fn resolve_as<T: Send + Sync + 'static>(
        &self,
        name: &str,
        scope: &Scope,
    ) -> AppResult<Arc<T>> {
        downcast_instance(self.resolve(name, scope)?, name)
    }

    /// Whether a name is currently registered
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(name)
    }

    fn resolve_with_stack(
        &self,
        name: &str,
        scope: &Scope,
        stack: &mut Vec<String>,
    ) -> AppResult<ServiceInstance> {
        let registration = self
            .registry
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::service_not_found(name))?;

        match registration.lifetime {
            Lifetime::Transient => self.construct(name, &registration, scope, stack),
            Lifetime::Scoped => {
                if let Some(existing) = scope.instances.get(name) {
                    return Ok(existing.clone());
                }
                let instance = self.construct(name, &registration, scope, stack)?;
                // First writer wins on a benign construction race
                Ok(scope
                    .instances
                    .entry(name.to_owned())
                    .or_insert(instance)
                    .clone())
            }
            Lifetime::Singleton => {
                if let Some(existing) = self.singletons.get(name) {
                    return Ok(existing.clone());
                }
                let instance = self.construct(name, &registration, scope, stack)?;
                Ok(self
                    .singletons
                    .entry(name.to_owned())
                    .or_insert(instance)
                    .clone())
            }
        }
    }

    fn construct(
        &self,
        name: &str,
        registration: &Registration,
        scope: &Scope,
        stack: &mut Vec<String>,
    ) -> AppResult<ServiceInstance> {
        if stack.iter().any(|entry| entry == name) {
            let mut chain = stack.clone();
            chain.push(name.to_owned());
            return Err(AppError::dependency_cycle(&chain));
        }
        stack.push(name.to_owned());

        let result = match &registration.definition {
            Definition::Factory(factory) => {
                let resolver = Resolver {
                    container: self,
                    scope,
                    stack: RefCell::new(stack.clone()),
                };
                factory(&resolver)
            }
            Definition::Constructor { dependencies, build } => {
                let resolved = dependencies
                    .iter()
                    .map(|dep| self.resolve_with_stack(dep, scope, stack))
                    .collect::<AppResult<Vec<_>>>()?;
                build(&resolved)
            }
        };

        stack.pop();
        result
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Downcast a resolved instance to a concrete type
///
/// # Errors
///
/// Returns an internal error naming the service when the stored instance is
/// not a `T` (a registration/consumer type mismatch).
pub fn downcast_instance<T: Send + Sync + 'static>(
    instance: ServiceInstance,
    name: &str,
) -> AppResult<Arc<T>> {
    instance.downcast::<T>().map_err(|_| {
        AppError::internal(format!(
            "service '{name}' is not a {}",
            std::any::type_name::<T>()
        ))
    })
}
