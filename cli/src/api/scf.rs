pub(crate) mod function;
pub(crate) mod logs;
pub(crate) mod namespace;
pub(crate) mod trigger;

use super::client::Client;
use super::error::ApiError;
use crate::credentials::Credentials;
use crate::template::function::FunctionDef;
use crate::template::trigger::Trigger;
use async_trait::async_trait;
use function::FunctionSummary;
use logs::LogRecord;
use serde::Deserialize;
use std::future::Future;

const SERVICE: &str = "scf";
const VERSION: &str = "2018-04-16";

/// Largest page the list calls accept
const PAGE_SIZE: u32 = 100;

/// Reply of calls that return nothing but a request id
#[derive(Deserialize)]
pub(crate) struct Empty {}

/// One page of a list call
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,

    /// Number of items across all pages
    pub(crate) total: u32,
}

/// Fetch pages by offset until the reported total is reached or a page comes back short
pub(crate) async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();

    loop {
        let page = fetch(items.len() as u32).await?;
        let received = page.items.len() as u32;
        items.extend(page.items);

        if received < PAGE_SIZE || items.len() as u32 >= page.total {
            return Ok(items);
        }
    }
}

/// Management API of the function platform
///
/// Implemented by `ScfClient`, tests substitute an in-memory platform.
#[async_trait]
pub(crate) trait FunctionPlatform: Send + Sync {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, ApiError>;

    async fn create_namespace(&self, namespace: &str) -> Result<(), ApiError>;

    /// Create the function, or update code and configuration of an existing one when forced
    async fn deploy_function(
        &self,
        namespace: &str,
        name: &str,
        function: &FunctionDef,
        forced: bool,
    ) -> Result<(), ApiError>;

    async fn deploy_trigger(
        &self,
        namespace: &str,
        function: &str,
        name: &str,
        trigger: &Trigger,
    ) -> Result<(), ApiError>;

    /// One page of invocation logs
    async fn function_logs(&self, request: &logs::Request) -> Result<Vec<LogRecord>, ApiError>;

    /// Every function of the namespace
    async fn list_functions(&self, namespace: &str) -> Result<Vec<FunctionSummary>, ApiError>;

    async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), ApiError>;
}

pub(crate) struct ScfClient {
    client: Client,
}

impl ScfClient {
    pub(crate) fn new(credentials: Credentials, region: &str) -> Self {
        ScfClient {
            client: Client::new(credentials, region, SERVICE, VERSION),
        }
    }
}

#[async_trait]
impl FunctionPlatform for ScfClient {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, ApiError> {
        let client = &self.client;

        let namespaces = collect_pages(|offset| async move {
            let response: namespace::ListResponse = client
                .request(
                    "ListNamespaces",
                    &namespace::ListRequest {
                        limit: PAGE_SIZE,
                        offset,
                    },
                )
                .await?;

            Ok(Page {
                items: response.namespaces,
                total: response.total_count,
            })
        })
        .await?;

        Ok(namespaces.iter().any(|ns| ns.name == namespace))
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), ApiError> {
        let _: Empty = self
            .client
            .request(
                "CreateNamespace",
                &namespace::CreateRequest {
                    namespace: namespace.to_string(),
                    description: "Created by scf deploy".into(),
                },
            )
            .await?;

        Ok(())
    }

    async fn deploy_function(
        &self,
        namespace: &str,
        name: &str,
        function: &FunctionDef,
        forced: bool,
    ) -> Result<(), ApiError> {
        let source = function.code.as_ref().ok_or_else(|| {
            ApiError::Package(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("function \"{name}\" has not been packaged"),
            ))
        })?;

        let code = function::Code::from_source(source, self.client.region()).await?;

        let existing: Result<function::GetResponse, ApiError> = self
            .client
            .request(
                "GetFunction",
                &function::GetRequest {
                    function_name: name.to_string(),
                    namespace: namespace.to_string(),
                },
            )
            .await;

        match existing {
            Err(error) if error.is_not_found() => {
                log::info!("Function {namespace}/{name} does not exist, creating");

                let _: Empty = self
                    .client
                    .request(
                        "CreateFunction",
                        &function::CreateRequest::new(namespace, name, function, code),
                    )
                    .await?;
            }

            Err(error) => return Err(error),

            Ok(_) if !forced => return Err(ApiError::AlreadyExists(name.to_string())),

            Ok(current) => {
                log::info!("Updating function {namespace}/{name} ({})", current.status);

                let _: Empty = self
                    .client
                    .request(
                        "UpdateFunctionCode",
                        &function::UpdateCodeRequest {
                            function_name: name.to_string(),
                            namespace: namespace.to_string(),
                            handler: function.properties.handler.clone(),
                            code,
                        },
                    )
                    .await?;

                let _: Empty = self
                    .client
                    .request(
                        "UpdateFunctionConfiguration",
                        &function::UpdateConfigurationRequest {
                            function_name: name.to_string(),
                            namespace: namespace.to_string(),
                            configuration: (&function.properties).into(),
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }

    async fn deploy_trigger(
        &self,
        namespace: &str,
        function: &str,
        name: &str,
        trigger: &Trigger,
    ) -> Result<(), ApiError> {
        let request = trigger::CreateRequest {
            function_name: function.to_string(),
            namespace: namespace.to_string(),
            trigger_name: trigger.remote_name(name),
            kind: trigger.kind.api_name().to_string(),
            trigger_desc: trigger.description(),
            enable: if trigger.is_enabled() { "OPEN" } else { "CLOSE" }.into(),
        };

        match self.client.request::<_, Empty>("CreateTrigger", &request).await {
            Ok(_) => Ok(()),

            // Triggers can not be updated in place, replace the existing one
            Err(error) if error.is_in_use() => {
                log::info!("Trigger {name} of {namespace}/{function} exists, replacing");

                let _: Empty = self
                    .client
                    .request(
                        "DeleteTrigger",
                        &trigger::DeleteRequest {
                            function_name: request.function_name.clone(),
                            namespace: request.namespace.clone(),
                            trigger_name: request.trigger_name.clone(),
                            kind: request.kind.clone(),
                            trigger_desc: request.trigger_desc.clone(),
                        },
                    )
                    .await?;

                let _: Empty = self.client.request("CreateTrigger", &request).await?;
                Ok(())
            }

            Err(error) => Err(error),
        }
    }

    async fn function_logs(&self, request: &logs::Request) -> Result<Vec<LogRecord>, ApiError> {
        let response: logs::Response = self.client.request("GetFunctionLogs", request).await?;
        Ok(response.data)
    }

    async fn list_functions(&self, namespace: &str) -> Result<Vec<FunctionSummary>, ApiError> {
        let client = &self.client;

        collect_pages(|offset| async move {
            let response: function::ListResponse = client
                .request(
                    "ListFunctions",
                    &function::ListRequest {
                        namespace: namespace.to_string(),
                        limit: PAGE_SIZE,
                        offset,
                    },
                )
                .await?;

            Ok(Page {
                items: response.functions,
                total: response.total_count,
            })
        })
        .await
    }

    async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        let _: Empty = self
            .client
            .request(
                "DeleteFunction",
                &function::DeleteRequest {
                    function_name: name.to_string(),
                    namespace: namespace.to_string(),
                },
            )
            .await?;

        Ok(())
    }
}
