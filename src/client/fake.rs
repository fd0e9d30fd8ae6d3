//! # In-Memory Resource Client
//!
//! A [`ResourceClient`] over an in-memory object store, populated through
//! [`FakeClientBuilder`]. It honours `resourceVersion` on status writes and can
//! be told to reject creations or to simulate concurrent status writers, which
//! makes it suitable for exercising full reconciliation passes in tests.

use super::{ClientError, ResourceClient};
use crate::crd::InfraDependency;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{ApiResource, DynamicObject};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type NamespacedKey = (String, String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    group: String,
    kind: String,
    namespace: String,
    name: String,
}

impl ObjectKey {
    fn new(resource: &ApiResource, namespace: &str, name: &str) -> Self {
        Self {
            group: resource.group.clone(),
            kind: resource.kind.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    secrets: BTreeMap<NamespacedKey, Secret>,
    services: BTreeMap<NamespacedKey, Service>,
    dependencies: BTreeMap<NamespacedKey, InfraDependency>,
    next_resource_version: u64,
    created: Vec<DynamicObject>,
    status_writes: usize,
    status_conflicts_to_inject: usize,
    reject_creates: Option<String>,
}

impl Store {
    fn bump_resource_version(&mut self) -> String {
        self.next_resource_version += 1;
        self.next_resource_version.to_string()
    }
}

/// In-memory [`ResourceClient`]
#[derive(Debug, Default)]
pub struct FakeResourceClient {
    store: Mutex<Store>,
}

/// Builder for [`FakeResourceClient`]
#[derive(Debug, Default)]
pub struct FakeClientBuilder {
    store: Store,
}

impl FakeClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a declaration. A missing generation defaults to 1.
    #[must_use]
    pub fn add_dependency(mut self, mut dependency: InfraDependency) -> Self {
        dependency.metadata.resource_version = Some(self.store.bump_resource_version());
        dependency.metadata.generation.get_or_insert(1);
        let key = (dependency.namespace_or_default(), dependency.name_any());
        self.store.dependencies.insert(key, dependency);
        self
    }

    /// Seed a custom object of any kind
    #[must_use]
    pub fn add_object(mut self, resource: &ApiResource, mut object: DynamicObject) -> Self {
        object.metadata.resource_version = Some(self.store.bump_resource_version());
        let namespace = object.namespace().unwrap_or_default();
        let key = ObjectKey::new(resource, &namespace, &object.name_any());
        self.store.objects.insert(key, object);
        self
    }

    #[must_use]
    pub fn add_secret(mut self, secret: Secret) -> Self {
        let key = (secret.namespace().unwrap_or_default(), secret.name_any());
        self.store.secrets.insert(key, secret);
        self
    }

    #[must_use]
    pub fn add_service(mut self, service: Service) -> Self {
        let key = (service.namespace().unwrap_or_default(), service.name_any());
        self.store.services.insert(key, service);
        self
    }

    /// Make every object creation fail as if rejected by admission
    #[must_use]
    pub fn reject_creates(mut self, message: impl Into<String>) -> Self {
        self.store.reject_creates = Some(message.into());
        self
    }

    /// Simulate `count` concurrent writers racing the next status writes
    #[must_use]
    pub fn inject_status_conflicts(mut self, count: usize) -> Self {
        self.store.status_conflicts_to_inject = count;
        self
    }

    #[must_use]
    pub fn build(self) -> FakeResourceClient {
        FakeResourceClient {
            store: Mutex::new(self.store),
        }
    }
}

impl FakeResourceClient {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of status writes that were accepted
    #[must_use]
    pub fn status_writes(&self) -> usize {
        self.store().status_writes
    }

    /// Objects created through [`ResourceClient::create_object`], in order
    #[must_use]
    pub fn created_objects(&self) -> Vec<DynamicObject> {
        self.store().created.clone()
    }

    /// Current stored copy of a declaration
    #[must_use]
    pub fn dependency(&self, namespace: &str, name: &str) -> Option<InfraDependency> {
        self.store()
            .dependencies
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Replace or insert a secret after the client has been built
    pub fn put_secret(&self, secret: Secret) {
        let key = (secret.namespace().unwrap_or_default(), secret.name_any());
        self.store().secrets.insert(key, secret);
    }

    /// Replace or insert a custom object after the client has been built
    pub fn put_object(&self, resource: &ApiResource, mut object: DynamicObject) {
        let mut store = self.store();
        object.metadata.resource_version = Some(store.bump_resource_version());
        let namespace = object.namespace().unwrap_or_default();
        let key = ObjectKey::new(resource, &namespace, &object.name_any());
        store.objects.insert(key, object);
    }
}

#[async_trait]
impl ResourceClient for FakeResourceClient {
    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, ClientError> {
        Ok(self
            .store()
            .objects
            .get(&ObjectKey::new(resource, namespace, name))
            .cloned())
    }

    async fn create_object(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject, ClientError> {
        let mut store = self.store();
        if let Some(message) = &store.reject_creates {
            return Err(ClientError::Rejected {
                code: 422,
                message: message.clone(),
            });
        }
        let namespace = object.namespace().ok_or_else(|| {
            ClientError::Invalid(format!("{} {} has no namespace", resource.kind, object.name_any()))
        })?;
        let key = ObjectKey::new(resource, &namespace, &object.name_any());
        if store.objects.contains_key(&key) {
            return Err(ClientError::Conflict(format!(
                "{} {}/{} already exists",
                resource.kind, namespace, key.name
            )));
        }

        let mut created = object.clone();
        created.metadata.resource_version = Some(store.bump_resource_version());
        created.metadata.generation = Some(1);
        store.objects.insert(key, created.clone());
        store.created.push(created.clone());
        Ok(created)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ClientError> {
        Ok(self
            .store()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, ClientError> {
        Ok(self
            .store()
            .services
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn get_dependency(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<InfraDependency>, ClientError> {
        Ok(self.dependency(namespace, name))
    }

    async fn replace_dependency_status(
        &self,
        dependency: &InfraDependency,
    ) -> Result<InfraDependency, ClientError> {
        let mut store = self.store();
        let key = (dependency.namespace_or_default(), dependency.name_any());

        if store.status_conflicts_to_inject > 0 {
            store.status_conflicts_to_inject -= 1;
            // Another writer got there first
            let bumped = store.bump_resource_version();
            if let Some(current) = store.dependencies.get_mut(&key) {
                current.metadata.resource_version = Some(bumped);
            }
            return Err(ClientError::Conflict(format!(
                "the object {}/{} has been modified",
                key.0, key.1
            )));
        }

        let current_version = match store.dependencies.get(&key) {
            Some(current) => current.metadata.resource_version.clone(),
            None => {
                return Err(ClientError::NotFound(format!(
                    "InfraDependency {}/{}",
                    key.0, key.1
                )))
            }
        };
        if dependency.metadata.resource_version.is_some()
            && dependency.metadata.resource_version != current_version
        {
            return Err(ClientError::Conflict(format!(
                "the object {}/{} has been modified",
                key.0, key.1
            )));
        }

        let resource_version = store.bump_resource_version();
        store.status_writes += 1;
        let stored = store
            .dependencies
            .get_mut(&key)
            .ok_or_else(|| ClientError::NotFound(format!("InfraDependency {}/{}", key.0, key.1)))?;
        stored.status.clone_from(&dependency.status);
        stored.metadata.resource_version = Some(resource_version);
        Ok(stored.clone())
    }
}
