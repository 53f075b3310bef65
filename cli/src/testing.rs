//! In-memory stand-ins for the remote services

use crate::api::cos::ObjectStorage;
use crate::api::scf::function::FunctionSummary;
use crate::api::scf::logs::{self, LogRecord};
use crate::api::scf::FunctionPlatform;
use crate::api::ApiError;
use crate::template::function::FunctionDef;
use crate::template::trigger::Trigger;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StorageCall {
    Exists(String),
    Create(String),
    Put { bucket: String, key: String },
}

/// Object storage where no bucket exists until created
#[derive(Default)]
pub(crate) struct FakeStorage {
    pub(crate) fail_exists: bool,
    pub(crate) fail_create: bool,
    pub(crate) fail_put: bool,
    pub(crate) calls: Mutex<Vec<StorageCall>>,
}

impl FakeStorage {
    pub(crate) fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StorageCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ApiError> {
        self.record(StorageCall::Exists(bucket.into()));

        if self.fail_exists {
            return Err(ApiError::remote("AccessDenied", "Access denied", Some("cos-req")));
        }

        let created = self
            .calls()
            .contains(&StorageCall::Create(bucket.to_string()));

        Ok(created)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ApiError> {
        self.record(StorageCall::Create(bucket.into()));

        if self.fail_create {
            return Err(ApiError::remote(
                "InvalidBucketName",
                "The bucket name is invalid",
                Some("cos-req"),
            ));
        }

        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, _body: Bytes) -> Result<(), ApiError> {
        self.record(StorageCall::Put {
            bucket: bucket.into(),
            key: key.into(),
        });

        if self.fail_put {
            return Err(ApiError::remote("InternalError", "Try again", Some("cos-req")));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlatformCall {
    NamespaceExists(String),
    CreateNamespace(String),
    DeployFunction { namespace: String, name: String },
    DeployTrigger { namespace: String, function: String, name: String },
    Logs { offset: u64, limit: u64 },
    ListFunctions(String),
    DeleteFunction { namespace: String, name: String },
}

/// Function platform that accepts everything unless told otherwise
#[derive(Default)]
pub(crate) struct FakePlatform {
    pub(crate) namespaces: HashSet<String>,
    pub(crate) fail_create_namespace: bool,

    /// Function names whose deployment is rejected
    pub(crate) failing_functions: HashSet<String>,

    /// Trigger names whose deployment is rejected
    pub(crate) failing_triggers: HashSet<String>,

    /// Pages returned by consecutive log calls, an empty page after they run out
    pub(crate) log_pages: Mutex<VecDeque<Vec<LogRecord>>>,

    /// Namespace -> names of the functions already deployed there
    pub(crate) deployed: HashMap<String, Vec<String>>,

    pub(crate) calls: Mutex<Vec<PlatformCall>>,
}

impl FakePlatform {
    pub(crate) fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FunctionPlatform for FakePlatform {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, ApiError> {
        self.record(PlatformCall::NamespaceExists(namespace.into()));
        Ok(self.namespaces.contains(namespace))
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), ApiError> {
        self.record(PlatformCall::CreateNamespace(namespace.into()));

        if self.fail_create_namespace {
            return Err(ApiError::remote(
                "LimitExceeded.Namespace",
                "Namespace limit exceeded",
                Some("ns-req"),
            ));
        }

        Ok(())
    }

    async fn deploy_function(
        &self,
        namespace: &str,
        name: &str,
        _function: &FunctionDef,
        _forced: bool,
    ) -> Result<(), ApiError> {
        self.record(PlatformCall::DeployFunction {
            namespace: namespace.into(),
            name: name.into(),
        });

        if self.failing_functions.contains(name) {
            return Err(ApiError::remote(
                "InvalidParameterValue.Runtime",
                "Unsupported runtime",
                Some("fn-req"),
            ));
        }

        Ok(())
    }

    async fn deploy_trigger(
        &self,
        namespace: &str,
        function: &str,
        name: &str,
        _trigger: &Trigger,
    ) -> Result<(), ApiError> {
        self.record(PlatformCall::DeployTrigger {
            namespace: namespace.into(),
            function: function.into(),
            name: name.into(),
        });

        if self.failing_triggers.contains(name) {
            return Err(ApiError::remote(
                "InvalidParameterValue.TriggerDesc",
                "Invalid trigger description",
                Some("trigger-req"),
            ));
        }

        Ok(())
    }

    async fn function_logs(&self, request: &logs::Request) -> Result<Vec<LogRecord>, ApiError> {
        self.record(PlatformCall::Logs {
            offset: request.offset,
            limit: request.limit,
        });

        Ok(self
            .log_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn list_functions(&self, namespace: &str) -> Result<Vec<FunctionSummary>, ApiError> {
        self.record(PlatformCall::ListFunctions(namespace.into()));

        if !self.namespaces.contains(namespace) {
            return Err(ApiError::remote(
                "ResourceNotFound.Namespace",
                "Namespace does not exist",
                Some("list-req"),
            ));
        }

        Ok(self
            .deployed
            .get(namespace)
            .into_iter()
            .flatten()
            .map(|name| FunctionSummary {
                function_name: name.clone(),
                runtime: "Python3.6".into(),
                status: "Active".into(),
                mod_time: "2020-01-01 10:00:00".into(),
                description: String::new(),
            })
            .collect())
    }

    async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        self.record(PlatformCall::DeleteFunction {
            namespace: namespace.into(),
            name: name.into(),
        });

        let exists = self
            .deployed
            .get(namespace)
            .is_some_and(|names| names.iter().any(|n| n == name));

        if !exists {
            return Err(ApiError::remote(
                "ResourceNotFound.Function",
                "Function does not exist",
                Some("delete-req"),
            ));
        }

        Ok(())
    }
}
