use crate::template::function::{CodeSource, FunctionDef, Properties};
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Code {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cos_bucket_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cos_object_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cos_bucket_region: Option<String>,

    /// Base64 encoded zip archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) zip_file: Option<String>,
}

impl Code {
    /// Build the code argument from wherever the packager put the archive
    pub(crate) async fn from_source(source: &CodeSource, region: &str) -> std::io::Result<Self> {
        Ok(match source {
            CodeSource::LocalZip(path) => Code {
                zip_file: Some(
                    base64::engine::general_purpose::STANDARD.encode(tokio::fs::read(path).await?),
                ),
                ..Default::default()
            },

            CodeSource::Cos { bucket, object } => Code {
                cos_bucket_name: Some(bucket.clone()),
                cos_object_name: Some(object.clone()),
                cos_bucket_region: Some(region.to_string()),
                ..Default::default()
            },
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Variable {
    pub(crate) key: String,
    pub(crate) value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Environment {
    pub(crate) variables: Vec<Variable>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct VpcConfig {
    pub(crate) vpc_id: String,
    pub(crate) subnet_id: String,
}

/// Function settings shared by the create and update calls
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) runtime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) memory_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) timeout: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) environment: Option<Environment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) vpc_config: Option<VpcConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
}

impl From<&Properties> for Configuration {
    fn from(properties: &Properties) -> Self {
        Configuration {
            runtime: properties.runtime.clone(),
            description: properties.description.clone(),
            memory_size: properties.memory_size,
            timeout: properties.timeout,
            environment: properties.environment.as_ref().map(|env| Environment {
                variables: env
                    .variables
                    .iter()
                    .map(|(key, value)| Variable {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            }),
            vpc_config: properties.vpc_config.as_ref().map(|vpc| VpcConfig {
                vpc_id: vpc.vpc_id.clone(),
                subnet_id: vpc.subnet_id.clone(),
            }),
            role: properties.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetResponse {
    #[serde(default)]
    pub(crate) status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListRequest {
    pub(crate) namespace: String,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub(crate) functions: Vec<FunctionSummary>,

    #[serde(default)]
    pub(crate) total_count: u32,
}

/// A deployed function as listed by the platform
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FunctionSummary {
    pub(crate) function_name: String,

    #[serde(default)]
    pub(crate) runtime: String,

    #[serde(default)]
    pub(crate) status: String,

    #[serde(default)]
    pub(crate) mod_time: String,

    #[serde(default)]
    pub(crate) description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DeleteRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,
    pub(crate) code: Code,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) handler: Option<String>,

    #[serde(flatten)]
    pub(crate) configuration: Configuration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UpdateCodeRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) handler: Option<String>,

    #[serde(flatten)]
    pub(crate) code: Code,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UpdateConfigurationRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,

    #[serde(flatten)]
    pub(crate) configuration: Configuration,
}

impl CreateRequest {
    pub(crate) fn new(namespace: &str, name: &str, function: &FunctionDef, code: Code) -> Self {
        CreateRequest {
            function_name: name.to_string(),
            namespace: namespace.to_string(),
            code,
            handler: function.properties.handler.clone(),
            configuration: Configuration::from(&function.properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::function::Environment as TemplateEnvironment;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn create_request_uses_api_field_names() {
        let function = FunctionDef {
            kind: "TencentCloud::Serverless::Function".into(),
            properties: Properties {
                handler: Some("index.main_handler".into()),
                runtime: Some("Python3.6".into()),
                memory_size: Some(128),
                environment: Some(TemplateEnvironment {
                    variables: BTreeMap::from([("STAGE".to_string(), "dev".to_string())]),
                }),
                ..Default::default()
            },
            code: None,
        };

        let source = CodeSource::Cos {
            bucket: "code".into(),
            object: "/default-hello-latest.zip".into(),
        };

        let code = Code::from_source(&source, "ap-guangzhou").await.unwrap();
        let request = CreateRequest::new("default", "hello", &function, code);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["FunctionName"], "hello");
        assert_eq!(json["Code"]["CosBucketName"], "code");
        assert_eq!(json["Code"]["CosBucketRegion"], "ap-guangzhou");
        assert_eq!(json["MemorySize"], 128);
        assert_eq!(json["Environment"]["Variables"][0]["Key"], "STAGE");
        assert!(json.get("Timeout").is_none());
    }

    #[tokio::test]
    async fn local_archive_is_sent_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.zip");
        std::fs::write(&path, b"zip").unwrap();

        let code = Code::from_source(&CodeSource::LocalZip(path), "ap-guangzhou")
            .await
            .unwrap();

        assert_eq!(code.zip_file.as_deref(), Some("emlw"));
        assert!(code.cos_bucket_name.is_none());
    }
}
