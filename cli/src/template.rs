pub(crate) mod function;
pub(crate) mod trigger;

use crate::error::{Error, ErrorKind};
use function::{FunctionDef, Properties};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_TEMPLATE: &str = "template.yaml";

const NAMESPACE_TYPE: &str = "TencentCloud::Serverless::Namespace";

/// Validate a parsed document
pub(crate) trait Validate {
    /// Returns vector of errors or None if all valid
    fn validate(&self) -> Option<Vec<String>>;
}

/// Functions grouped under a namespace
#[derive(Debug, Clone, Default)]
pub(crate) struct Namespace {
    /// Value of the namespace's own `Type` key
    pub(crate) kind: Option<String>,

    /// In declaration order
    pub(crate) functions: IndexMap<String, FunctionDef>,
}

/// Namespace name -> namespace, in declaration order
pub(crate) type Resources = IndexMap<String, Namespace>;

/// A namespace mapping holds its `Type` next to the functions
#[derive(Deserialize)]
#[serde(untagged)]
enum NamespaceEntry {
    Kind(String),
    Function(Box<FunctionDef>),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct Globals {
    #[serde(default)]
    function: Properties,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Document {
    #[serde(default)]
    globals: Globals,

    #[serde(default)]
    resources: IndexMap<String, IndexMap<String, NamespaceEntry>>,
}

/// Parsed template file
#[derive(Debug, Clone)]
pub(crate) struct Template {
    path: PathBuf,
    pub(crate) resources: Resources,

    /// Entries that are neither the namespace type nor a function
    stray: Vec<String>,
}

impl Template {
    /// Read, parse and validate the template file
    pub(crate) fn from_path(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::new(
                ErrorKind::Template,
                &format!("Template not found: {}", path.display()),
                Some("Pass the path with --template-file or run the command next to template.yaml."),
            ));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            log::error!("Failed to read {path:?}: {e:?}");
            Error::new(
                ErrorKind::Template,
                &format!("Failed to read {}", path.display()),
                None,
            )
        })?;

        // Code directories are resolved relative to the template
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let template = Self::parse(&text, &path)?;

        if let Some(errors) = template.validate() {
            return Err(Error::new(
                ErrorKind::Template,
                "Invalid template",
                Some(&errors.join("\n")),
            ));
        }

        Ok(template)
    }

    /// Parse the document and apply globals, without validation
    pub(crate) fn parse(text: &str, path: &Path) -> Result<Self, Error> {
        let document: Document = serde_saphyr::from_str(text).map_err(|e| {
            Error::new(
                ErrorKind::Template,
                "Failed to parse the template",
                Some(&e.to_string()),
            )
        })?;

        let mut resources = Resources::new();
        let mut stray = Vec::new();

        for (namespace_name, entries) in document.resources {
            let mut namespace = Namespace::default();

            for (key, entry) in entries {
                match entry {
                    NamespaceEntry::Kind(kind) if key == "Type" => namespace.kind = Some(kind),
                    NamespaceEntry::Kind(_) => stray.push(format!("{namespace_name}.{key}")),
                    NamespaceEntry::Function(mut function) => {
                        function.apply_globals(&document.globals.function);
                        namespace.functions.insert(key, *function);
                    }
                }
            }

            resources.insert(namespace_name, namespace);
        }

        Ok(Template {
            path: path.to_path_buf(),
            resources,
            stray,
        })
    }

    /// Directory the template file lives in
    pub(crate) fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Validate for Template {
    fn validate(&self) -> Option<Vec<String>> {
        let mut errors: Vec<String> = self
            .stray
            .iter()
            .map(|entry| format!("Unexpected entry \"{entry}\""))
            .collect();

        if self.resources.is_empty() {
            errors.push("The template declares no resources".into());
        }

        for (name, namespace) in &self.resources {
            if let Some(kind) = namespace.kind.as_deref() {
                if kind != NAMESPACE_TYPE {
                    errors.push(format!(
                        "Namespace \"{name}\" has unknown type \"{kind}\", expected \"{NAMESPACE_TYPE}\""
                    ));
                }
            }

            for (function_name, function) in &namespace.functions {
                errors.extend(function.validate(function_name));
            }
        }

        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::trigger::TriggerKind;
    use super::*;

    const TEMPLATE: &str = r#"
Globals:
  Function:
    Timeout: 10
    Environment:
      Variables:
        STAGE: prod
Resources:
  default:
    Type: TencentCloud::Serverless::Namespace
    hello:
      Type: TencentCloud::Serverless::Function
      Properties:
        CodeUri: ./hello
        Handler: index.main_handler
        Runtime: Python3.6
        MemorySize: 128
        Environment:
          Variables:
            STAGE: dev
            DEBUG: "1"
        Events:
          every5m:
            Type: Timer
            Properties:
              CronExpression: "*/5 * * * *"
              Enable: true
  jobs:
    Type: TencentCloud::Serverless::Namespace
    nightly:
      Type: TencentCloud::Serverless::Function
      Properties:
        CodeUri: ./nightly
        Handler: main.handler
        Runtime: Nodejs12.16
"#;

    fn parse(text: &str) -> Template {
        Template::parse(text, Path::new("/project/template.yaml")).unwrap()
    }

    #[test]
    fn parses_namespaces_functions_and_events() {
        let template = parse(TEMPLATE);
        assert!(template.validate().is_none());
        assert_eq!(template.dir(), Path::new("/project"));

        let default = &template.resources["default"];
        assert_eq!(default.kind.as_deref(), Some(NAMESPACE_TYPE));

        let hello = &default.functions["hello"];
        assert_eq!(hello.properties.code_uri, "./hello");
        assert_eq!(hello.properties.events["every5m"].kind, TriggerKind::Timer);
        assert!(template.resources["jobs"].functions.contains_key("nightly"));
    }

    #[test]
    fn globals_fill_unset_properties() {
        let template = parse(TEMPLATE);
        let hello = &template.resources["default"].functions["hello"];
        let env = &hello.properties.environment.as_ref().unwrap().variables;

        assert_eq!(hello.properties.timeout, Some(10));
        assert_eq!(env["STAGE"], "dev");
        assert_eq!(env["DEBUG"], "1");

        let nightly = &template.resources["jobs"].functions["nightly"];
        assert_eq!(
            nightly.properties.environment.as_ref().unwrap().variables["STAGE"],
            "prod"
        );
    }

    #[test]
    fn all_problems_are_reported_at_once() {
        let template = parse(
            r#"
Resources:
  default:
    Type: TencentCloud::Serverless::Namespace
    broken:
      Type: TencentCloud::Serverless::Function
      Properties:
        CodeUri: ./broken
        MemorySize: 100
        Timeout: 1000
"#,
        );

        let errors = template.validate().unwrap();
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn missing_file_is_a_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Template::from_path(&dir.path().join("template.yaml")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Template);
    }
}
